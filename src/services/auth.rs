use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::models::account::UserType;
use crate::db::models::profile::{NewProfile, Profile};
use crate::db::store::{Store, StoreError};
use crate::domain::validation::validate_registration;
use crate::error::{AppError, AppResult};

/// JWT Claims used for authentication.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub email: String,
    pub user_type: UserType,
    /// Token id, used for sign-out revocation
    pub jti: String,
    /// Expiration timestamp (UNIX TIME)
    pub exp: usize,
}

impl Claims {
    pub fn account_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Unauthorized("Invalid user ID format in token"))
    }
}

pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub user_type: UserType,
    pub phone: Option<String>,
}

pub struct IssuedToken {
    pub token: String,
    pub user_type: UserType,
}

pub fn issue_token(config: &Config, account_id: Uuid, email: &str, user_type: UserType) -> AppResult<String> {
    let exp = Utc::now().timestamp() as usize + config.token_ttl.as_secs() as usize;
    let claims = Claims {
        sub: account_id.to_string(),
        email: email.to_string(),
        user_type,
        jti: Uuid::new_v4().to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))
}

pub fn decode_token(config: &Config, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

pub async fn register(store: &dyn Store, config: &Config, form: Registration) -> AppResult<Profile> {
    let email = validate_registration(&form.email, &form.password, &form.full_name)?;

    let cost = config.bcrypt_cost;
    let password = form.password;
    let password_hash = tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))?;

    let profile = NewProfile {
        user_type: form.user_type,
        full_name: form.full_name.trim().to_string(),
        phone: form.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
    };

    match store.create_account(&email, &password_hash, profile).await {
        Ok((_, profile)) => {
            info!("Registered {} account {}", profile.user_type.as_str(), email);
            Ok(profile)
        }
        Err(StoreError::Conflict(_)) => Err(AppError::Conflict(
            "This email is already registered. Please sign in instead.",
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn login(store: &dyn Store, config: &Config, email: &str, password: &str) -> AppResult<IssuedToken> {
    const INVALID: AppError = AppError::Unauthorized("Invalid email or password. Please try again.");

    let email = email.trim().to_lowercase();
    let Some(account) = store.find_account_by_email(&email).await? else {
        warn!("Login attempt for non-existent account: {email}");
        return Err(INVALID);
    };

    let password = password.to_string();
    let password_hash = account.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(format!("Password verification error: {e}")))?;
    if !valid {
        warn!("Invalid password attempt for account: {email}");
        return Err(INVALID);
    }

    let profile = store
        .find_profile_by_user(account.id)
        .await?
        .ok_or(AppError::NotFound("Profile not found. Please try again."))?;

    let token = issue_token(config, account.id, &account.email, profile.user_type)?;
    info!("Login successful for account: {email}");
    Ok(IssuedToken {
        token,
        user_type: profile.user_type,
    })
}
