use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "vehicle_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Bike,
    Car,
    Truck,
    AutoRickshaw,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Vehicle {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub vehicle_type: VehicleType,
    pub brand: String,
    pub model: String,
    pub registration_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct NewVehicle {
    pub vehicle_type: Option<VehicleType>,
    pub brand: String,
    pub model: String,
    pub registration_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VehicleRecord {
    pub profile_id: Uuid,
    pub vehicle_type: VehicleType,
    pub brand: String,
    pub model: String,
    pub registration_number: Option<String>,
}
