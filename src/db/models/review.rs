use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub garage_id: Uuid,
    pub service_request_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct NewReview {
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub customer_id: Uuid,
    pub garage_id: Uuid,
    pub service_request_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}
