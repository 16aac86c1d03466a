use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Router,
};
use uuid::Uuid;

use crate::api::extract::{Json, Path};
use crate::app_state::AppState;
use crate::db::models::garage::{AvailabilityUpdate, Garage, NewGarage};
use crate::db::models::review::Review;
use crate::services::profiles::CurrentUser;
use crate::services::{garages, reviews};
use crate::utils::api_response::ApiResponse;

/// Set up the caller's garage
#[utoipa::path(
    post,
    path = "/garages",
    request_body = NewGarage,
    responses(
        (status = 201, description = "Garage created", body = Garage),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Caller is not a garage account"),
        (status = 409, description = "Garage already set up")
    ),
    tag = "Garages",
    security(("bearerAuth" = []))
)]
pub async fn setup_garage(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<NewGarage>,
) -> Result<ApiResponse<Garage>, ApiResponse<()>> {
    let garage = garages::setup_garage(state.store.as_ref(), &user, payload).await?;
    state.forget_profile(user.account_id);
    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Garage profile created successfully!",
        garage,
    ))
}

/// Go online or offline
#[utoipa::path(
    patch,
    path = "/garages/me/availability",
    request_body = AvailabilityUpdate,
    responses(
        (status = 200, description = "Availability updated", body = Garage),
        (status = 404, description = "Garage not set up")
    ),
    tag = "Garages",
    security(("bearerAuth" = []))
)]
pub async fn update_availability(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<AvailabilityUpdate>,
) -> Result<ApiResponse<Garage>, ApiResponse<()>> {
    let garage = garages::set_availability(state.store.as_ref(), &user, payload.is_available).await?;
    state.forget_profile(user.account_id);
    let message = if garage.is_available {
        "You are now online"
    } else {
        "You are now offline"
    };
    Ok(ApiResponse::success(StatusCode::OK, message, garage))
}

/// Reviews left for a garage, newest first
#[utoipa::path(
    get,
    path = "/garages/{id}/reviews",
    params(("id" = Uuid, Path, description = "Garage ID")),
    responses(
        (status = 200, description = "Reviews", body = [Review]),
        (status = 404, description = "Garage not found")
    ),
    tag = "Garages",
    security(("bearerAuth" = []))
)]
pub async fn garage_reviews(
    State(state): State<AppState>,
    Path(garage_id): Path<Uuid>,
) -> Result<ApiResponse<Vec<Review>>, ApiResponse<()>> {
    let reviews = reviews::garage_reviews(state.store.as_ref(), garage_id).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Reviews retrieved", reviews))
}

pub fn garage_routes() -> Router<AppState> {
    Router::new()
        .route("/garages", post(setup_garage))
        .route("/garages/me/availability", patch(update_availability))
        .route("/garages/{id}/reviews", get(garage_reviews))
}

#[derive(utoipa::OpenApi)]
#[openapi(
    paths(setup_garage, update_availability, garage_reviews),
    components(schemas(Garage, NewGarage, AvailabilityUpdate, Review)),
    tags((name = "Garages", description = "Garage setup and availability"))
)]
pub struct GarageDoc;
