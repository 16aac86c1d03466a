use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::account::UserType;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_type: UserType,
    pub full_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_customer(&self) -> bool {
        self.user_type == UserType::Customer
    }

    pub fn is_garage(&self) -> bool {
        self.user_type == UserType::Garage
    }
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_type: UserType,
    pub full_name: String,
    pub phone: Option<String>,
}
