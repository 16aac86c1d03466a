use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use moka::sync::Cache;
use serde_json::json;
use tracing::{debug, error};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::services::auth::{decode_token, Claims};
use crate::services::profiles::{resolve_profile, CurrentUser, ResolvedProfile};
use crate::utils::api_response::ApiResponse;

/// Resolved profiles keyed by account id.
pub type ProfileCache = Arc<Cache<Uuid, ResolvedProfile>>;

/// Token ids that were signed out before they expired.
pub type RevokedTokens = Arc<Cache<String, ()>>;

pub fn create_profile_cache(ttl: Duration) -> ProfileCache {
    Arc::new(Cache::builder().max_capacity(10_000).time_to_live(ttl).build())
}

/// Entries live as long as a token can, after which the token is dead anyway.
pub fn create_revoked_tokens(ttl: Duration) -> RevokedTokens {
    Arc::new(Cache::builder().time_to_live(ttl).build())
}

fn unauthorized(message: &str) -> Response {
    ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, message, None).into_response()
}

/// **JWT Middleware** (Handles Token Authentication)
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = req.headers().get(AUTHORIZATION).ok_or_else(|| {
        debug!("Missing Authorization header");
        unauthorized("Missing Authorization header")
    })?;

    let token_str = auth_header.to_str().map_err(|_| {
        error!("Invalid Authorization header format");
        ApiResponse::<()>::error(StatusCode::BAD_REQUEST, "Invalid Authorization header format", None)
            .into_response()
    })?;

    let token = token_str.strip_prefix("Bearer ").ok_or_else(|| {
        error!("Invalid token format (missing 'Bearer ' prefix)");
        ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            "Invalid token format (missing 'Bearer ' prefix)",
            None,
        )
        .into_response()
    })?;

    let claims = decode_token(&state.config, token).map_err(|e| {
        debug!("JWT decoding failed: {e:?}");
        ApiResponse::<()>::error(
            StatusCode::UNAUTHORIZED,
            "Invalid token",
            Some(json!({ "error": e.to_string() })),
        )
        .into_response()
    })?;

    if state.revoked_tokens.contains_key(&claims.jti) {
        return Err(unauthorized("Session has ended. Please sign in again."));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// **Profile Middleware**: attaches a [`CurrentUser`], resolving through the cache.
/// Must run after [`jwt_middleware`].
pub async fn profile_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let claims = req.extensions().get::<Claims>().cloned().ok_or_else(|| {
        error!("Missing JWT claims in request");
        unauthorized("Missing JWT claims in request")
    })?;

    let account_id = claims.account_id().map_err(|_| {
        error!("Invalid user ID format in JWT claims");
        unauthorized("Invalid user ID format in JWT claims")
    })?;

    let resolved = match state.profiles.get(&account_id) {
        Some(cached) => cached,
        None => {
            let resolved = resolve_profile(state.store.as_ref(), account_id).await;
            // Empty results are not cached so a profile created a moment
            // later shows up on the next request.
            if resolved.profile.is_some() {
                state.profiles.insert(account_id, resolved.clone());
            }
            resolved
        }
    };

    req.extensions_mut().insert(CurrentUser { account_id, resolved });
    Ok(next.run(req).await)
}
