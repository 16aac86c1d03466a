use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Router,
};
use uuid::Uuid;

use crate::api::extract::{Json, Path};
use crate::app_state::AppState;
use crate::db::models::review::{NewReview, Review};
use crate::db::models::service_request::{
    CustomerRequests, GeoPoint, NewServiceRequest, RequestEvent, RequestStatus, RequestWithCustomer,
    ServiceRequest, ServiceType, StatusUpdate,
};
use crate::services::profiles::CurrentUser;
use crate::services::{requests, reviews};
use crate::utils::api_response::ApiResponse;

/// Request roadside help
#[utoipa::path(
    post,
    path = "/requests",
    request_body = NewServiceRequest,
    responses(
        (status = 201, description = "Request created", body = ServiceRequest),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Only customers can create requests")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn create_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<NewServiceRequest>,
) -> Result<ApiResponse<ServiceRequest>, ApiResponse<()>> {
    let request = requests::create_request(state.store.as_ref(), &user, payload).await?;
    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Request sent! Nearby garages will be notified.",
        request,
    ))
}

/// The caller's ten most recent requests, split into active and past
#[utoipa::path(
    get,
    path = "/requests/mine",
    responses((status = 200, description = "Customer requests", body = CustomerRequests)),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn my_requests(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<ApiResponse<CustomerRequests>, ApiResponse<()>> {
    let requests = requests::customer_requests(state.store.as_ref(), &user).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Requests retrieved", requests))
}

/// All pending requests, newest first
#[utoipa::path(
    get,
    path = "/requests/pending",
    responses((status = 200, description = "Pending requests", body = [RequestWithCustomer])),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn pending_requests(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<ApiResponse<Vec<RequestWithCustomer>>, ApiResponse<()>> {
    let requests = requests::pending_requests(state.store.as_ref(), &user).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Pending requests retrieved", requests))
}

/// Open requests assigned to the caller's garage
#[utoipa::path(
    get,
    path = "/requests/assigned",
    responses((status = 200, description = "Assigned requests", body = [RequestWithCustomer])),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn assigned_requests(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<ApiResponse<Vec<RequestWithCustomer>>, ApiResponse<()>> {
    let requests = requests::assigned_requests(state.store.as_ref(), &user).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Assigned requests retrieved", requests))
}

#[utoipa::path(
    get,
    path = "/requests/{id}",
    params(("id" = Uuid, Path, description = "Service request ID")),
    responses(
        (status = 200, description = "Request found", body = ServiceRequest),
        (status = 404, description = "Request not found")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(request_id): Path<Uuid>,
) -> Result<ApiResponse<ServiceRequest>, ApiResponse<()>> {
    let request = requests::request_detail(state.store.as_ref(), &user, request_id).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Request found", request))
}

/// Status history, oldest first
#[utoipa::path(
    get,
    path = "/requests/{id}/events",
    params(("id" = Uuid, Path, description = "Service request ID")),
    responses(
        (status = 200, description = "Status history", body = [RequestEvent]),
        (status = 404, description = "Request not found")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn request_events(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(request_id): Path<Uuid>,
) -> Result<ApiResponse<Vec<RequestEvent>>, ApiResponse<()>> {
    let events = requests::request_events(state.store.as_ref(), &user, request_id).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Request history retrieved", events))
}

/// Accept a pending request for the caller's garage
#[utoipa::path(
    post,
    path = "/requests/{id}/accept",
    params(("id" = Uuid, Path, description = "Service request ID")),
    responses(
        (status = 200, description = "Request accepted", body = ServiceRequest),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Already taken, or the garage is offline")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn accept_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(request_id): Path<Uuid>,
) -> Result<ApiResponse<ServiceRequest>, ApiResponse<()>> {
    let request = requests::accept(state.store.as_ref(), &user, request_id).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Request accepted!", request))
}

/// Move a request to an explicit status
#[utoipa::path(
    patch,
    path = "/requests/{id}/status",
    params(("id" = Uuid, Path, description = "Service request ID")),
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Status updated", body = ServiceRequest),
        (status = 403, description = "Caller may not make this change"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<StatusUpdate>,
) -> Result<ApiResponse<ServiceRequest>, ApiResponse<()>> {
    let request = requests::set_status(state.store.as_ref(), &user, request_id, payload.status).await?;
    Ok(ApiResponse::success(
        StatusCode::OK,
        format!("Status updated to {}", request.status),
        request,
    ))
}

/// Take the next step in the garage workflow
#[utoipa::path(
    post,
    path = "/requests/{id}/advance",
    params(("id" = Uuid, Path, description = "Service request ID")),
    responses(
        (status = 200, description = "Status advanced", body = ServiceRequest),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Nothing left to advance")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn advance_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(request_id): Path<Uuid>,
) -> Result<ApiResponse<ServiceRequest>, ApiResponse<()>> {
    let request = requests::advance(state.store.as_ref(), &user, request_id).await?;
    Ok(ApiResponse::success(
        StatusCode::OK,
        format!("Status updated to {}", request.status),
        request,
    ))
}

#[utoipa::path(
    post,
    path = "/requests/{id}/cancel",
    params(("id" = Uuid, Path, description = "Service request ID")),
    responses(
        (status = 200, description = "Request cancelled", body = ServiceRequest),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is no longer pending")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn cancel_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(request_id): Path<Uuid>,
) -> Result<ApiResponse<ServiceRequest>, ApiResponse<()>> {
    let request = requests::cancel(state.store.as_ref(), &user, request_id).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Request cancelled", request))
}

/// Rate the garage that completed the request
#[utoipa::path(
    post,
    path = "/requests/{id}/review",
    params(("id" = Uuid, Path, description = "Service request ID")),
    request_body = NewReview,
    responses(
        (status = 201, description = "Review saved", body = Review),
        (status = 400, description = "Rating out of range"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Not completed, or already reviewed")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn review_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<NewReview>,
) -> Result<ApiResponse<Review>, ApiResponse<()>> {
    let review = reviews::create_review(state.store.as_ref(), &user, request_id, payload).await?;
    Ok(ApiResponse::success(StatusCode::CREATED, "Thanks for your feedback!", review))
}

pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/requests", post(create_request))
        .route("/requests/mine", get(my_requests))
        .route("/requests/pending", get(pending_requests))
        .route("/requests/assigned", get(assigned_requests))
        .route("/requests/{id}", get(get_request))
        .route("/requests/{id}/events", get(request_events))
        .route("/requests/{id}/accept", post(accept_request))
        .route("/requests/{id}/status", patch(update_status))
        .route("/requests/{id}/advance", post(advance_request))
        .route("/requests/{id}/cancel", post(cancel_request))
        .route("/requests/{id}/review", post(review_request))
}

#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        create_request, my_requests, pending_requests, assigned_requests, get_request,
        request_events, accept_request, update_status, advance_request, cancel_request,
        review_request
    ),
    components(schemas(
        ServiceRequest, NewServiceRequest, RequestWithCustomer, CustomerRequests, RequestEvent,
        RequestStatus, ServiceType, GeoPoint, StatusUpdate, NewReview
    )),
    tags((name = "Service Requests", description = "Request lifecycle"))
)]
pub struct RequestDoc;
