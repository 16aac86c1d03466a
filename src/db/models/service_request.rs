// src/db/models/service_request.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "service_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Puncture,
    EngineIssue,
    Battery,
    Towing,
    OilChange,
    BrakeIssue,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    OnTheWay,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::OnTheWay => "on_the_way",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled requests never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub garage_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub service_type: ServiceType,
    pub status: RequestStatus,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub problem_description: Option<String>,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ServiceRequest {
    /// Coordinates of the request, unless they are the `0,0` manual-address fallback.
    pub fn location(&self) -> Option<GeoPoint> {
        if self.latitude == 0.0 && self.longitude == 0.0 {
            None
        } else {
            Some(GeoPoint { lat: self.latitude, lng: self.longitude })
        }
    }
}

/// Request form as sent by the customer.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct NewServiceRequest {
    pub service_type: Option<ServiceType>,
    pub problem_description: Option<String>,
    /// Captured device location.
    pub location: Option<GeoPoint>,
    /// Manually entered address.
    pub address: Option<String>,
    pub vehicle_id: Option<Uuid>,
}

/// Validated request row ready for insertion. Status is always pending.
#[derive(Debug, Clone)]
pub struct ServiceRequestRecord {
    pub customer_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub service_type: ServiceType,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub problem_description: Option<String>,
}

/// A request joined with the customer's contact details, as garages see it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RequestWithCustomer {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: ServiceRequest,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// The customer's most recent requests split into open and finished ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CustomerRequests {
    pub active: Vec<ServiceRequest>,
    pub past: Vec<ServiceRequest>,
}

impl CustomerRequests {
    pub fn partition(requests: Vec<ServiceRequest>) -> Self {
        let (past, active) = requests
            .into_iter()
            .partition(|request| request.status.is_terminal());
        Self { active, past }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Customer,
    Garage,
}

/// One applied lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RequestEvent {
    pub id: Uuid,
    pub request_id: Uuid,
    pub from_status: Option<RequestStatus>,
    pub to_status: RequestStatus,
    pub actor_kind: ActorKind,
    pub actor_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Who is allowed to perform a conditional status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOwner {
    Customer(Uuid),
    Garage(Uuid),
}

impl RequestOwner {
    pub fn actor_kind(self) -> ActorKind {
        match self {
            RequestOwner::Customer(_) => ActorKind::Customer,
            RequestOwner::Garage(_) => ActorKind::Garage,
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            RequestOwner::Customer(id) | RequestOwner::Garage(id) => id,
        }
    }
}

/// Conditional status write: applied only while the row still has `expected`
/// status and belongs to `owner`.
#[derive(Debug, Clone, Copy)]
pub struct StatusChange {
    pub request_id: Uuid,
    pub owner: RequestOwner,
    pub expected: RequestStatus,
    pub next: RequestStatus,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct StatusUpdate {
    pub status: RequestStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(status: RequestStatus) -> ServiceRequest {
        let now = Utc::now();
        ServiceRequest {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            garage_id: None,
            vehicle_id: None,
            service_type: ServiceType::Battery,
            status,
            address: Some("Main street 1".into()),
            latitude: 0.0,
            longitude: 0.0,
            problem_description: None,
            estimated_arrival: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn partition_splits_terminal_from_open_requests() {
        let requests = vec![
            request_with(RequestStatus::Pending),
            request_with(RequestStatus::Completed),
            request_with(RequestStatus::InProgress),
            request_with(RequestStatus::Cancelled),
        ];

        let split = CustomerRequests::partition(requests);

        assert_eq!(split.active.len(), 2);
        assert_eq!(split.past.len(), 2);
        assert!(split.active.iter().all(|r| !r.status.is_terminal()));
        assert!(split.past.iter().all(|r| r.status.is_terminal()));
    }

    #[test]
    fn manual_address_fallback_has_no_location() {
        let mut request = request_with(RequestStatus::Pending);
        assert!(request.location().is_none());

        request.latitude = 12.5;
        request.longitude = 77.25;
        assert_eq!(request.location(), Some(GeoPoint { lat: 12.5, lng: 77.25 }));
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&RequestStatus::OnTheWay).unwrap();
        assert_eq!(json, "\"on_the_way\"");
    }

    fn binds_in_postgres<T: for<'q> sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>>() {}

    #[test]
    fn enum_lists_bind_as_postgres_arrays() {
        use crate::db::models::vehicle::VehicleType;

        binds_in_postgres::<Vec<ServiceType>>();
        binds_in_postgres::<Vec<VehicleType>>();

        let services: Vec<ServiceType> = serde_json::from_str(r#"["towing","oil_change"]"#).unwrap();
        assert_eq!(services, vec![ServiceType::Towing, ServiceType::OilChange]);
    }
}
