use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::service_request::{GeoPoint, ServiceType};
use super::vehicle::VehicleType;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Garage {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub garage_name: String,
    pub description: Option<String>,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub services_offered: Vec<ServiceType>,
    pub vehicle_types_serviced: Vec<VehicleType>,
    pub is_available: bool,
    pub rating: f64,
    pub total_reviews: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Garage {
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }
}

/// Garage setup form as sent by the frontend.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct NewGarage {
    pub garage_name: String,
    pub description: Option<String>,
    pub address: String,
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub services_offered: Vec<ServiceType>,
    #[serde(default)]
    pub vehicle_types_serviced: Vec<VehicleType>,
}

/// Validated garage row ready for insertion.
#[derive(Debug, Clone)]
pub struct GarageRecord {
    pub profile_id: Uuid,
    pub garage_name: String,
    pub description: Option<String>,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub services_offered: Vec<ServiceType>,
    pub vehicle_types_serviced: Vec<VehicleType>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct AvailabilityUpdate {
    pub is_available: bool,
}
