use axum::{extract::State, http::StatusCode, routing::get, Router};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::utils::api_response::ApiResponse;

/// Defines health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check))
}

/// **Liveness Check**: the process is up. Does not touch the store.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "API is live"))
)]
pub async fn liveness_check() -> ApiResponse<Value> {
    ApiResponse::success(StatusCode::OK, "API is live", json!({ "status": "live" }))
}

/// **Readiness Check**: the store answers.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "API is ready"),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn readiness_check(State(state): State<AppState>) -> Result<ApiResponse<Value>, ApiResponse<()>> {
    state.store.ping().await.map_err(|e| {
        tracing::error!("Readiness check failed: {e}");
        ApiResponse::error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Store unavailable",
            Some(json!({ "error": e.to_string() })),
        )
    })?;

    Ok(ApiResponse::success(StatusCode::OK, "API is ready", json!({ "status": "ready" })))
}

#[derive(utoipa::OpenApi)]
#[openapi(paths(liveness_check, readiness_check), tags((name = "Health")))]
pub struct HealthDoc;
