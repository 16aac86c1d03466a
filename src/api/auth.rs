use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::openapi::Components;
use utoipa::{Modify, OpenApi, ToSchema};

use crate::api::extract::Json;
use crate::app_state::AppState;
use crate::db::models::account::UserType;
use crate::db::models::profile::Profile;
use crate::services::auth::{self, Claims, Registration};
use crate::utils::api_response::ApiResponse;

/// Sign-up form.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    /// At least 6 characters
    pub password: String,
    pub full_name: String,
    pub user_type: UserType,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A bearer token plus the account kind, which decides the landing page.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user_type: UserType,
}

/// Handles account registration.
///
/// # Returns
/// * `201 Created` - Account and profile created.
/// * `400 Bad Request` - Field validation failed.
/// * `409 Conflict` - The email is already registered.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "Authentication",
    responses(
        (status = 201, description = "Account created", body = Profile),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ApiResponse<Profile>, ApiResponse<()>> {
    let form = Registration {
        email: payload.email,
        password: payload.password,
        full_name: payload.full_name,
        user_type: payload.user_type,
        phone: payload.phone,
    };
    let profile = auth::register(state.store.as_ref(), &state.config, form).await?;
    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Account created successfully! You can now sign in.",
        profile,
    ))
}

/// Handles sign-in.
///
/// # Returns
/// * `200 OK` - A JWT and the account kind.
/// * `401 Unauthorized` - Unknown email or wrong password.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "Authentication",
    responses(
        (status = 200, description = "Successful login", body = LoginResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, ApiResponse<()>> {
    let issued = auth::login(state.store.as_ref(), &state.config, &payload.email, &payload.password).await?;
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Welcome back!",
        LoginResponse {
            token: issued.token,
            user_type: issued.user_type,
        },
    ))
}

/// Ends the session: the presented token stops working immediately.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Authentication",
    responses(
        (status = 200, description = "Signed out"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    state.revoked_tokens.insert(claims.jti.clone(), ());
    if let Ok(account_id) = claims.account_id() {
        state.forget_profile(account_id);
    }
    info!("Signed out {}", claims.email);
    Ok(ApiResponse::success(StatusCode::OK, "Signed out", ()))
}

/// Registers the **public** authentication routes.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Registers the **protected** authentication routes.
pub fn secure_auth_routes() -> Router<AppState> {
    Router::new().route("/auth/logout", post(logout))
}

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.clone().unwrap_or(Components::default());
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
        openapi.components = Some(components);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(login, register, logout),
    components(schemas(LoginRequest, LoginResponse, RegisterRequest, UserType, Profile)),
    tags((name = "Authentication", description = "Sign-up, sign-in and sign-out")),
    modifiers(&SecurityAddon)
)]
pub struct AuthDoc;
