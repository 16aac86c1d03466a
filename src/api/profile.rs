use axum::{http::StatusCode, routing::get, Extension, Router};

use crate::app_state::AppState;
use crate::services::profiles::{CurrentUser, ResolvedProfile};
use crate::utils::api_response::ApiResponse;

/// The caller's profile and, for garage operators, their garage.
/// Either may be absent; the client shows its setup page in that case.
#[utoipa::path(
    get,
    path = "/profile/me",
    tag = "Profile",
    responses((status = 200, description = "Resolved profile", body = ResolvedProfile)),
    security(("bearerAuth" = []))
)]
pub async fn me(Extension(user): Extension<CurrentUser>) -> ApiResponse<ResolvedProfile> {
    ApiResponse::success(StatusCode::OK, "Profile resolved", user.resolved)
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile/me", get(me))
}

#[derive(utoipa::OpenApi)]
#[openapi(paths(me), components(schemas(ResolvedProfile)), tags((name = "Profile")))]
pub struct ProfileDoc;
