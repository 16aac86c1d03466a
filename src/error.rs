use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::db::store::StoreError;
use crate::domain::lifecycle::TransitionError;
use crate::domain::validation::ValidationErrors;
use crate::utils::api_response::ApiResponse;

/// Everything a service call can fail with. Converted into the response
/// envelope at the handler boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Rejected { status, .. } => *status,
            AppError::Transition(TransitionError::NotPermitted { .. }) => StatusCode::FORBIDDEN,
            AppError::Transition(TransitionError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            AppError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for ApiResponse<()> {
    fn from(err: AppError) -> Self {
        let status = err.status();
        match err {
            AppError::Validation(errors) => ApiResponse::error(
                status,
                "Validation failed",
                serde_json::to_value(&errors).ok(),
            ),
            AppError::Store(StoreError::Conflict(what)) => {
                ApiResponse::error(status, format!("{what} already exists"), None)
            }
            AppError::Store(e) => {
                error!("store failure: {e}");
                ApiResponse::error(
                    status,
                    "Something went wrong. Please try again.",
                    Some(json!({ "error": e.to_string() })),
                )
            }
            AppError::Internal(e) => {
                error!("internal failure: {e}");
                ApiResponse::error(
                    status,
                    "Something went wrong. Please try again.",
                    Some(json!({ "error": e })),
                )
            }
            other => ApiResponse::error(status, other.to_string(), None),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
