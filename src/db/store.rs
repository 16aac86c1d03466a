//! Persistence port.
//!
//! Handlers and services only ever see `dyn Store`. Two adapters exist:
//! [`PgStore`](super::postgres::PgStore) and
//! [`MemoryStore`](super::memory::MemoryStore). Both must apply
//! [`RequestStore::claim_pending`] and [`RequestStore::change_status`]
//! atomically: the precondition check and the write happen as one step.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::models::account::Account;
use crate::db::models::garage::{Garage, GarageRecord};
use crate::db::models::profile::{NewProfile, Profile};
use crate::db::models::review::{Review, ReviewRecord};
use crate::db::models::service_request::{
    RequestEvent, RequestWithCustomer, ServiceRequest, ServiceRequestRecord, StatusChange,
};
use crate::db::models::vehicle::{Vehicle, VehicleRecord};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result of a conditional accept.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    Claimed(ServiceRequest),
    NotFound,
    /// The accepting garage has switched itself offline.
    GarageUnavailable,
    /// Someone else got there first, or the request left `pending`.
    AlreadyTaken,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create the account and its profile together.
    async fn create_account(
        &self,
        email: &str,
        password_hash: &str,
        profile: NewProfile,
    ) -> Result<(Account, Profile), StoreError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;
}

#[async_trait]
pub trait GarageStore: Send + Sync {
    async fn create_garage(&self, record: GarageRecord) -> Result<Garage, StoreError>;

    async fn find_garage(&self, garage_id: Uuid) -> Result<Option<Garage>, StoreError>;

    async fn find_garage_by_profile(&self, profile_id: Uuid) -> Result<Option<Garage>, StoreError>;

    async fn set_availability(
        &self,
        garage_id: Uuid,
        is_available: bool,
    ) -> Result<Option<Garage>, StoreError>;
}

#[async_trait]
pub trait VehicleStore: Send + Sync {
    async fn create_vehicle(&self, record: VehicleRecord) -> Result<Vehicle, StoreError>;

    /// Newest first.
    async fn list_vehicles(&self, profile_id: Uuid) -> Result<Vec<Vehicle>, StoreError>;

    async fn find_vehicle(&self, vehicle_id: Uuid) -> Result<Option<Vehicle>, StoreError>;

    /// Deletes only if `profile_id` owns the vehicle. Returns whether a row was removed.
    async fn delete_vehicle(&self, vehicle_id: Uuid, profile_id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Insert a pending, unassigned request and its creation event.
    async fn insert_request(
        &self,
        record: ServiceRequestRecord,
        at: DateTime<Utc>,
    ) -> Result<ServiceRequest, StoreError>;

    async fn find_request(&self, request_id: Uuid) -> Result<Option<ServiceRequest>, StoreError>;

    /// The customer's requests, newest first, at most `limit`.
    async fn list_customer_requests(
        &self,
        customer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ServiceRequest>, StoreError>;

    /// Every pending request, newest first.
    async fn list_pending_requests(&self) -> Result<Vec<RequestWithCustomer>, StoreError>;

    /// Requests assigned to the garage that are not completed or cancelled, newest first.
    async fn list_open_garage_requests(
        &self,
        garage_id: Uuid,
    ) -> Result<Vec<RequestWithCustomer>, StoreError>;

    /// Assign the request to `garage_id` and mark it accepted, only if it is
    /// still pending and unassigned and the garage is available.
    async fn claim_pending(
        &self,
        request_id: Uuid,
        garage_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StoreError>;

    /// Apply `change` only if the row still has `change.expected` status and
    /// belongs to `change.owner`. `None` when the precondition failed.
    async fn change_status(&self, change: StatusChange) -> Result<Option<ServiceRequest>, StoreError>;

    /// Audit trail, oldest first.
    async fn list_request_events(&self, request_id: Uuid) -> Result<Vec<RequestEvent>, StoreError>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Insert the review and refresh the garage's rating and review count.
    async fn create_review(&self, record: ReviewRecord) -> Result<Review, StoreError>;

    /// Newest first.
    async fn list_garage_reviews(&self, garage_id: Uuid) -> Result<Vec<Review>, StoreError>;
}

#[async_trait]
pub trait Store:
    AccountStore + ProfileStore + GarageStore + VehicleStore + RequestStore + ReviewStore
{
    /// Connectivity check for the readiness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}
