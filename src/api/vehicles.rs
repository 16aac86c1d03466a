use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Extension, Router,
};
use uuid::Uuid;

use crate::api::extract::{Json, Path};
use crate::app_state::AppState;
use crate::db::models::vehicle::{NewVehicle, Vehicle, VehicleType};
use crate::services::profiles::CurrentUser;
use crate::services::vehicles;
use crate::utils::api_response::ApiResponse;

#[utoipa::path(
    get,
    path = "/vehicles",
    responses((status = 200, description = "The caller's vehicles, newest first", body = [Vehicle])),
    tag = "Vehicles",
    security(("bearerAuth" = []))
)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<ApiResponse<Vec<Vehicle>>, ApiResponse<()>> {
    let vehicles = vehicles::list_vehicles(state.store.as_ref(), &user).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Vehicles retrieved", vehicles))
}

#[utoipa::path(
    post,
    path = "/vehicles",
    request_body = NewVehicle,
    responses(
        (status = 201, description = "Vehicle added", body = Vehicle),
        (status = 400, description = "Validation failed")
    ),
    tag = "Vehicles",
    security(("bearerAuth" = []))
)]
pub async fn add_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<NewVehicle>,
) -> Result<ApiResponse<Vehicle>, ApiResponse<()>> {
    let vehicle = vehicles::add_vehicle(state.store.as_ref(), &user, payload).await?;
    Ok(ApiResponse::success(StatusCode::CREATED, "Vehicle added successfully", vehicle))
}

#[utoipa::path(
    delete,
    path = "/vehicles/{id}",
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle removed"),
        (status = 404, description = "No such vehicle owned by the caller")
    ),
    tag = "Vehicles",
    security(("bearerAuth" = []))
)]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    vehicles::delete_vehicle(state.store.as_ref(), &user, vehicle_id).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Vehicle removed", ()))
}

pub fn vehicle_routes() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(list_vehicles).post(add_vehicle))
        .route("/vehicles/{id}", delete(delete_vehicle))
}

#[derive(utoipa::OpenApi)]
#[openapi(
    paths(list_vehicles, add_vehicle, delete_vehicle),
    components(schemas(Vehicle, NewVehicle, VehicleType)),
    tags((name = "Vehicles"))
)]
pub struct VehicleDoc;
