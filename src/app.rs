//! Router assembly: public routes, JWT-protected routes, API docs and the
//! tower-http layer stack.

use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::api::auth::AuthDoc;
use crate::api::garages::GarageDoc;
use crate::api::health::HealthDoc;
use crate::api::profile::ProfileDoc;
use crate::api::requests::RequestDoc;
use crate::api::vehicles::VehicleDoc;
use crate::app_state::AppState;
use crate::middleware::auth::{jwt_middleware, profile_middleware};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Slow handlers are cut off with 408 rather than tower-http's default 500.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

pub fn api_doc() -> utoipa::openapi::OpenApi {
    AuthDoc::openapi()
        .merge_from(HealthDoc::openapi())
        .merge_from(ProfileDoc::openapi())
        .merge_from(GarageDoc::openapi())
        .merge_from(VehicleDoc::openapi())
        .merge_from(RequestDoc::openapi())
}

pub fn build_app(state: AppState) -> Router {
    let merged_doc = api_doc();

    let public_routes = Router::new()
        .merge(api::health::health_routes())
        .merge(api::auth::auth_routes());

    // Layers run bottom-up: the token is checked before the profile is resolved.
    let private_routes = Router::new()
        .merge(api::auth::secure_auth_routes())
        .merge(api::profile::profile_routes())
        .merge(api::garages::garage_routes())
        .merge(api::vehicles::vehicle_routes())
        .merge(api::requests::request_routes())
        .route_layer(from_fn_with_state(state.clone(), profile_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_middleware));

    Router::new()
        .merge(public_routes)
        .merge(private_routes)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", merged_doc.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/rapidoc.json", merged_doc).path("/rapidoc"))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(timeout_layer(state.config.request_timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
