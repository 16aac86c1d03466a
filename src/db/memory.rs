//! In-memory [`Store`] used by tests and by the server when no
//! `DATABASE_URL` is configured. Every operation takes the table lock once,
//! so conditional writes are atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::account::Account;
use crate::db::models::garage::{Garage, GarageRecord};
use crate::db::models::profile::{NewProfile, Profile};
use crate::db::models::review::{Review, ReviewRecord};
use crate::db::models::service_request::{
    ActorKind, RequestEvent, RequestOwner, RequestStatus, RequestWithCustomer, ServiceRequest,
    ServiceRequestRecord, StatusChange,
};
use crate::db::models::vehicle::{Vehicle, VehicleRecord};
use crate::db::store::{
    AccountStore, ClaimOutcome, GarageStore, ProfileStore, RequestStore, ReviewStore, Store,
    StoreError, VehicleStore,
};

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    profiles: Vec<Profile>,
    garages: Vec<Garage>,
    vehicles: Vec<Vehicle>,
    requests: Vec<ServiceRequest>,
    events: Vec<RequestEvent>,
    reviews: Vec<Review>,
}

impl Tables {
    fn with_customer(&self, request: &ServiceRequest) -> RequestWithCustomer {
        let customer = self.profiles.iter().find(|p| p.id == request.customer_id);
        RequestWithCustomer {
            request: request.clone(),
            customer_name: customer.map(|p| p.full_name.clone()).unwrap_or_default(),
            customer_phone: customer.and_then(|p| p.phone.clone()),
            distance_km: None,
        }
    }

    fn push_event(
        &mut self,
        request_id: Uuid,
        from_status: Option<RequestStatus>,
        to_status: RequestStatus,
        actor_kind: ActorKind,
        actor_id: Uuid,
        at: DateTime<Utc>,
    ) {
        self.events.push(RequestEvent {
            id: Uuid::new_v4(),
            request_id,
            from_status,
            to_status,
            actor_kind,
            actor_id,
            created_at: at,
        });
    }
}

/// Rows in insertion order; "newest first" reads walk them backwards.
fn newest_first<T: Clone>(rows: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().rev().cloned().collect();
    out.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    out
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(
        &self,
        email: &str,
        password_hash: &str,
        profile: NewProfile,
    ) -> Result<(Account, Profile), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.accounts.iter().any(|a| a.email == email) {
            return Err(StoreError::Conflict("email"));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
        };
        let profile = Profile {
            id: Uuid::new_v4(),
            user_id: account.id,
            user_type: profile.user_type,
            full_name: profile.full_name,
            phone: profile.phone,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        tables.accounts.push(account.clone());
        tables.profiles.push(profile.clone());
        Ok((account, profile))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.iter().find(|a| a.email == email).cloned())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }
}

#[async_trait]
impl GarageStore for MemoryStore {
    async fn create_garage(&self, record: GarageRecord) -> Result<Garage, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.garages.iter().any(|g| g.profile_id == record.profile_id) {
            return Err(StoreError::Conflict("garage"));
        }

        let now = Utc::now();
        let garage = Garage {
            id: Uuid::new_v4(),
            profile_id: record.profile_id,
            garage_name: record.garage_name,
            description: record.description,
            address: record.address,
            latitude: record.latitude,
            longitude: record.longitude,
            services_offered: record.services_offered,
            vehicle_types_serviced: record.vehicle_types_serviced,
            is_available: true,
            rating: 0.0,
            total_reviews: 0,
            created_at: now,
            updated_at: now,
        };
        tables.garages.push(garage.clone());
        Ok(garage)
    }

    async fn find_garage(&self, garage_id: Uuid) -> Result<Option<Garage>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.garages.iter().find(|g| g.id == garage_id).cloned())
    }

    async fn find_garage_by_profile(&self, profile_id: Uuid) -> Result<Option<Garage>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.garages.iter().find(|g| g.profile_id == profile_id).cloned())
    }

    async fn set_availability(
        &self,
        garage_id: Uuid,
        is_available: bool,
    ) -> Result<Option<Garage>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.garages.iter_mut().find(|g| g.id == garage_id).map(|garage| {
            garage.is_available = is_available;
            garage.updated_at = Utc::now();
            garage.clone()
        }))
    }
}

#[async_trait]
impl VehicleStore for MemoryStore {
    async fn create_vehicle(&self, record: VehicleRecord) -> Result<Vehicle, StoreError> {
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            profile_id: record.profile_id,
            vehicle_type: record.vehicle_type,
            brand: record.brand,
            model: record.model,
            registration_number: record.registration_number,
            created_at: Utc::now(),
        };
        self.tables.write().await.vehicles.push(vehicle.clone());
        Ok(vehicle)
    }

    async fn list_vehicles(&self, profile_id: Uuid) -> Result<Vec<Vehicle>, StoreError> {
        let tables = self.tables.read().await;
        let owned: Vec<Vehicle> = tables
            .vehicles
            .iter()
            .filter(|v| v.profile_id == profile_id)
            .cloned()
            .collect();
        Ok(newest_first(&owned, |v| v.created_at))
    }

    async fn find_vehicle(&self, vehicle_id: Uuid) -> Result<Option<Vehicle>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.vehicles.iter().find(|v| v.id == vehicle_id).cloned())
    }

    async fn delete_vehicle(&self, vehicle_id: Uuid, profile_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.vehicles.len();
        tables
            .vehicles
            .retain(|v| !(v.id == vehicle_id && v.profile_id == profile_id));
        if tables.vehicles.len() == before {
            return Ok(false);
        }
        for request in tables.requests.iter_mut().filter(|r| r.vehicle_id == Some(vehicle_id)) {
            request.vehicle_id = None;
        }
        Ok(true)
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn insert_request(
        &self,
        record: ServiceRequestRecord,
        at: DateTime<Utc>,
    ) -> Result<ServiceRequest, StoreError> {
        let request = ServiceRequest {
            id: Uuid::new_v4(),
            customer_id: record.customer_id,
            garage_id: None,
            vehicle_id: record.vehicle_id,
            service_type: record.service_type,
            status: RequestStatus::Pending,
            address: record.address,
            latitude: record.latitude,
            longitude: record.longitude,
            problem_description: record.problem_description,
            estimated_arrival: None,
            created_at: at,
            updated_at: at,
            completed_at: None,
        };

        let mut tables = self.tables.write().await;
        tables.requests.push(request.clone());
        tables.push_event(
            request.id,
            None,
            RequestStatus::Pending,
            ActorKind::Customer,
            request.customer_id,
            at,
        );
        Ok(request)
    }

    async fn find_request(&self, request_id: Uuid) -> Result<Option<ServiceRequest>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.requests.iter().find(|r| r.id == request_id).cloned())
    }

    async fn list_customer_requests(
        &self,
        customer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ServiceRequest>, StoreError> {
        let tables = self.tables.read().await;
        let own: Vec<ServiceRequest> = tables
            .requests
            .iter()
            .filter(|r| r.customer_id == customer_id)
            .cloned()
            .collect();
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(newest_first(&own, |r| r.created_at).into_iter().take(limit).collect())
    }

    async fn list_pending_requests(&self) -> Result<Vec<RequestWithCustomer>, StoreError> {
        let tables = self.tables.read().await;
        let pending: Vec<ServiceRequest> = tables
            .requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .cloned()
            .collect();
        Ok(newest_first(&pending, |r| r.created_at)
            .iter()
            .map(|r| tables.with_customer(r))
            .collect())
    }

    async fn list_open_garage_requests(
        &self,
        garage_id: Uuid,
    ) -> Result<Vec<RequestWithCustomer>, StoreError> {
        let tables = self.tables.read().await;
        let open: Vec<ServiceRequest> = tables
            .requests
            .iter()
            .filter(|r| r.garage_id == Some(garage_id) && !r.status.is_terminal())
            .cloned()
            .collect();
        Ok(newest_first(&open, |r| r.created_at)
            .iter()
            .map(|r| tables.with_customer(r))
            .collect())
    }

    async fn claim_pending(
        &self,
        request_id: Uuid,
        garage_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StoreError> {
        let mut tables = self.tables.write().await;

        let available = tables
            .garages
            .iter()
            .any(|g| g.id == garage_id && g.is_available);
        let Some(request) = tables.requests.iter_mut().find(|r| r.id == request_id) else {
            return Ok(ClaimOutcome::NotFound);
        };
        if !available {
            return Ok(ClaimOutcome::GarageUnavailable);
        }
        if request.status != RequestStatus::Pending || request.garage_id.is_some() {
            return Ok(ClaimOutcome::AlreadyTaken);
        }

        request.garage_id = Some(garage_id);
        request.status = RequestStatus::Accepted;
        request.updated_at = at;
        let claimed = request.clone();

        tables.push_event(
            request_id,
            Some(RequestStatus::Pending),
            RequestStatus::Accepted,
            ActorKind::Garage,
            garage_id,
            at,
        );
        Ok(ClaimOutcome::Claimed(claimed))
    }

    async fn change_status(&self, change: StatusChange) -> Result<Option<ServiceRequest>, StoreError> {
        let mut tables = self.tables.write().await;

        let Some(request) = tables.requests.iter_mut().find(|r| r.id == change.request_id) else {
            return Ok(None);
        };
        let owned = match change.owner {
            RequestOwner::Customer(id) => request.customer_id == id,
            RequestOwner::Garage(id) => request.garage_id == Some(id),
        };
        if !owned || request.status != change.expected {
            return Ok(None);
        }

        request.status = change.next;
        request.updated_at = change.at;
        if change.next == RequestStatus::Completed {
            request.completed_at = Some(change.at);
        }
        let updated = request.clone();

        tables.push_event(
            change.request_id,
            Some(change.expected),
            change.next,
            change.owner.actor_kind(),
            change.owner.id(),
            change.at,
        );
        Ok(Some(updated))
    }

    async fn list_request_events(&self, request_id: Uuid) -> Result<Vec<RequestEvent>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .filter(|e| e.request_id == request_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn create_review(&self, record: ReviewRecord) -> Result<Review, StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .reviews
            .iter()
            .any(|r| r.service_request_id == record.service_request_id)
        {
            return Err(StoreError::Conflict("review"));
        }

        let review = Review {
            id: Uuid::new_v4(),
            customer_id: record.customer_id,
            garage_id: record.garage_id,
            service_request_id: record.service_request_id,
            rating: record.rating,
            comment: record.comment,
            created_at: Utc::now(),
        };
        tables.reviews.push(review.clone());

        let ratings: Vec<i32> = tables
            .reviews
            .iter()
            .filter(|r| r.garage_id == review.garage_id)
            .map(|r| r.rating)
            .collect();
        if let Some(garage) = tables.garages.iter_mut().find(|g| g.id == review.garage_id) {
            garage.total_reviews += 1;
            garage.rating = f64::from(ratings.iter().sum::<i32>()) / ratings.len() as f64;
            garage.updated_at = review.created_at;
        }
        Ok(review)
    }

    async fn list_garage_reviews(&self, garage_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let tables = self.tables.read().await;
        let reviews: Vec<Review> = tables
            .reviews
            .iter()
            .filter(|r| r.garage_id == garage_id)
            .cloned()
            .collect();
        Ok(newest_first(&reviews, |r| r.created_at))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::account::UserType;
    use crate::db::models::service_request::ServiceType;
    use crate::db::models::vehicle::VehicleType;
    use std::sync::Arc;

    async fn customer(store: &MemoryStore, email: &str) -> Profile {
        let (_, profile) = store
            .create_account(
                email,
                "hash",
                NewProfile {
                    user_type: UserType::Customer,
                    full_name: "Asha".into(),
                    phone: Some("555-0100".into()),
                },
            )
            .await
            .unwrap();
        profile
    }

    async fn garage(store: &MemoryStore, email: &str) -> Garage {
        let (_, profile) = store
            .create_account(
                email,
                "hash",
                NewProfile {
                    user_type: UserType::Garage,
                    full_name: "Ravi".into(),
                    phone: None,
                },
            )
            .await
            .unwrap();
        store
            .create_garage(GarageRecord {
                profile_id: profile.id,
                garage_name: "Ravi Motors".into(),
                description: None,
                address: "NH 48".into(),
                latitude: None,
                longitude: None,
                services_offered: vec![ServiceType::Towing],
                vehicle_types_serviced: vec![VehicleType::Car],
            })
            .await
            .unwrap()
    }

    fn record(customer_id: Uuid) -> ServiceRequestRecord {
        ServiceRequestRecord {
            customer_id,
            vehicle_id: None,
            service_type: ServiceType::Towing,
            address: Some("Exit 12".into()),
            latitude: 0.0,
            longitude: 0.0,
            problem_description: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        customer(&store, "a@example.com").await;
        let err = store
            .create_account(
                "a@example.com",
                "hash",
                NewProfile {
                    user_type: UserType::Customer,
                    full_name: "Other".into(),
                    phone: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict("email")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn only_one_concurrent_claim_wins() {
        let store = Arc::new(MemoryStore::new());
        let owner = customer(&store, "c@example.com").await;
        let request_id = store
            .insert_request(record(owner.id), Utc::now())
            .await
            .unwrap()
            .id;

        let mut garages = Vec::new();
        for i in 0..8 {
            garages.push(garage(&store, &format!("g{i}@example.com")).await);
        }

        let handles: Vec<_> = garages
            .iter()
            .map(|g| {
                let store = Arc::clone(&store);
                let garage_id = g.id;
                tokio::spawn(async move { store.claim_pending(request_id, garage_id, Utc::now()).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                ClaimOutcome::Claimed(_) => winners += 1,
                ClaimOutcome::AlreadyTaken => {}
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(winners, 1);

        let events = store.list_request_events(request_id).await.unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn change_status_checks_expected_status_and_owner() {
        let store = MemoryStore::new();
        let owner = customer(&store, "c@example.com").await;
        let g = garage(&store, "g@example.com").await;
        let request = store.insert_request(record(owner.id), Utc::now()).await.unwrap();
        store.claim_pending(request.id, g.id, Utc::now()).await.unwrap();

        let wrong_garage = StatusChange {
            request_id: request.id,
            owner: RequestOwner::Garage(Uuid::new_v4()),
            expected: RequestStatus::Accepted,
            next: RequestStatus::OnTheWay,
            at: Utc::now(),
        };
        assert!(store.change_status(wrong_garage).await.unwrap().is_none());

        let stale = StatusChange {
            owner: RequestOwner::Garage(g.id),
            expected: RequestStatus::Pending,
            ..wrong_garage
        };
        assert!(store.change_status(stale).await.unwrap().is_none());

        let ok = StatusChange {
            owner: RequestOwner::Garage(g.id),
            ..wrong_garage
        };
        let updated = store.change_status(ok).await.unwrap().unwrap();
        assert_eq!(updated.status, RequestStatus::OnTheWay);
        assert!(updated.completed_at.is_none());
    }

    #[tokio::test]
    async fn customer_listing_is_newest_first_and_limited() {
        let store = MemoryStore::new();
        let owner = customer(&store, "c@example.com").await;
        let start = Utc::now();
        for i in 0..12 {
            store
                .insert_request(record(owner.id), start + chrono::Duration::seconds(i))
                .await
                .unwrap();
        }

        let listed = store.list_customer_requests(owner.id, 10).await.unwrap();
        assert_eq!(listed.len(), 10);
        assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(listed[0].created_at, start + chrono::Duration::seconds(11));
    }

    #[tokio::test]
    async fn review_updates_garage_rating() {
        let store = MemoryStore::new();
        let owner = customer(&store, "c@example.com").await;
        let g = garage(&store, "g@example.com").await;

        for rating in [5, 2] {
            store
                .create_review(ReviewRecord {
                    customer_id: owner.id,
                    garage_id: g.id,
                    service_request_id: Uuid::new_v4(),
                    rating,
                    comment: None,
                })
                .await
                .unwrap();
        }

        let garage = store.find_garage(g.id).await.unwrap().unwrap();
        assert_eq!(garage.total_reviews, 2);
        assert!((garage.rating - 3.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn deleting_a_vehicle_detaches_it_from_requests() {
        let store = MemoryStore::new();
        let owner = customer(&store, "c@example.com").await;
        let vehicle = store
            .create_vehicle(VehicleRecord {
                profile_id: owner.id,
                vehicle_type: VehicleType::Car,
                brand: "Maruti".into(),
                model: "Swift".into(),
                registration_number: None,
            })
            .await
            .unwrap();
        let request = store
            .insert_request(
                ServiceRequestRecord {
                    vehicle_id: Some(vehicle.id),
                    ..record(owner.id)
                },
                Utc::now(),
            )
            .await
            .unwrap();

        assert!(!store.delete_vehicle(vehicle.id, Uuid::new_v4()).await.unwrap());
        let kept = store.find_request(request.id).await.unwrap().unwrap();
        assert_eq!(kept.vehicle_id, Some(vehicle.id));

        assert!(store.delete_vehicle(vehicle.id, owner.id).await.unwrap());
        let detached = store.find_request(request.id).await.unwrap().unwrap();
        assert_eq!(detached.vehicle_id, None);
        assert_eq!(detached.status, RequestStatus::Pending);
    }
}
