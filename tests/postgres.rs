//! `PgStore` against a live PostgreSQL. Point `TEST_DATABASE_URL` at a scratch
//! database to run these; without it every test prints a skip notice and passes.

use chrono::Utc;
use uuid::Uuid;

use roadassist::db::models::account::UserType;
use roadassist::db::models::garage::{Garage, GarageRecord};
use roadassist::db::models::profile::{NewProfile, Profile};
use roadassist::db::models::review::ReviewRecord;
use roadassist::db::models::service_request::{
    RequestOwner, RequestStatus, ServiceRequestRecord, ServiceType, StatusChange,
};
use roadassist::db::models::vehicle::{VehicleRecord, VehicleType};
use roadassist::db::pool::{get_db_pool, run_migrations};
use roadassist::db::postgres::PgStore;
use roadassist::db::store::{
    AccountStore, ClaimOutcome, GarageStore, RequestStore, ReviewStore, StoreError, VehicleStore,
};

async fn pg_store() -> Option<PgStore> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("SKIP-TEST-DATABASE: TEST_DATABASE_URL is not set");
        return None;
    };
    let pool = get_db_pool(&url, 16).await.expect("connect to TEST_DATABASE_URL");
    run_migrations(&pool).await.expect("run migrations");
    Some(PgStore::new(pool))
}

fn unique_email() -> String {
    format!("{}@example.com", Uuid::new_v4())
}

async fn account(store: &PgStore, user_type: UserType) -> Profile {
    let (_, profile) = store
        .create_account(
            &unique_email(),
            "hash",
            NewProfile {
                user_type,
                full_name: "Test User".into(),
                phone: None,
            },
        )
        .await
        .unwrap();
    profile
}

async fn garage(store: &PgStore) -> Garage {
    let owner = account(store, UserType::Garage).await;
    store
        .create_garage(GarageRecord {
            profile_id: owner.id,
            garage_name: "Ravi Motors".into(),
            description: None,
            address: "NH 48".into(),
            latitude: Some(12.97),
            longitude: Some(77.59),
            services_offered: vec![ServiceType::Towing, ServiceType::Battery],
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
    let Some(store) = pg_store().await else { return };
    let email = unique_email();
    let profile = || NewProfile {
        user_type: UserType::Customer,
        full_name: "Asha".into(),
        phone: None,
    };

    store.create_account(&email, "hash", profile()).await.unwrap();
    let err = store.create_account(&email, "hash", profile()).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict("email")));
}

#[tokio::test]
async fn garage_enum_lists_survive_a_round_trip() {
    let Some(store) = pg_store().await else { return };
    let g = garage(&store).await;

    let found = store.find_garage(g.id).await.unwrap().unwrap();
    assert_eq!(found.services_offered, vec![ServiceType::Towing, ServiceType::Battery]);
    assert_eq!(found.vehicle_types_serviced, vec![VehicleType::Car]);
    assert!(found.is_available);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn only_one_concurrent_claim_wins() {
    let Some(store) = pg_store().await else { return };
    let owner = account(&store, UserType::Customer).await;
    let request_id = store
        .insert_request(record(owner.id), Utc::now())
        .await
        .unwrap()
        .id;

    let mut garages = Vec::new();
    for _ in 0..8 {
        garages.push(garage(&store).await);
    }

    let handles: Vec<_> = garages
        .iter()
        .map(|g| {
            let store = store.clone();
            let garage_id = g.id;
            tokio::spawn(async move { store.claim_pending(request_id, garage_id, Utc::now()).await })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            ClaimOutcome::Claimed(request) => winners.push(request),
            ClaimOutcome::AlreadyTaken => {}
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(winners.len(), 1);

    let stored = store.find_request(request_id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Accepted);
    assert_eq!(stored.garage_id, winners[0].garage_id);
    assert_eq!(store.list_request_events(request_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn stale_or_foreign_status_changes_are_refused() {
    let Some(store) = pg_store().await else { return };
    let owner = account(&store, UserType::Customer).await;
    let g = garage(&store).await;
    let request = store.insert_request(record(owner.id), Utc::now()).await.unwrap();
    store.claim_pending(request.id, g.id, Utc::now()).await.unwrap();

    let foreign = StatusChange {
        request_id: request.id,
        owner: RequestOwner::Garage(Uuid::new_v4()),
        expected: RequestStatus::Accepted,
        next: RequestStatus::OnTheWay,
        at: Utc::now(),
    };
    assert!(store.change_status(foreign).await.unwrap().is_none());

    let stale = StatusChange {
        owner: RequestOwner::Garage(g.id),
        expected: RequestStatus::Pending,
        ..foreign
    };
    assert!(store.change_status(stale).await.unwrap().is_none());

    let ok = StatusChange {
        owner: RequestOwner::Garage(g.id),
        ..foreign
    };
    let updated = store.change_status(ok).await.unwrap().unwrap();
    assert_eq!(updated.status, RequestStatus::OnTheWay);
    assert!(updated.completed_at.is_none());

    // Replaying the same change now finds `on_the_way`, not `accepted`.
    assert!(store.change_status(ok).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reviews_keep_garage_aggregates_exact() {
    let Some(store) = pg_store().await else { return };
    let owner = account(&store, UserType::Customer).await;
    let g = garage(&store).await;

    let ratings = [5, 4, 3, 5, 1, 2, 4, 5];
    let mut request_ids = Vec::new();
    for _ in ratings {
        request_ids.push(store.insert_request(record(owner.id), Utc::now()).await.unwrap().id);
    }

    let handles: Vec<_> = ratings
        .iter()
        .zip(request_ids)
        .map(|(&rating, service_request_id)| {
            let store = store.clone();
            let record = ReviewRecord {
                customer_id: owner.id,
                garage_id: g.id,
                service_request_id,
                rating,
                comment: None,
            };
            tokio::spawn(async move { store.create_review(record).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let garage = store.find_garage(g.id).await.unwrap().unwrap();
    let mean = ratings.iter().sum::<i32>() as f64 / ratings.len() as f64;
    assert_eq!(garage.total_reviews, ratings.len() as i32);
    assert!((garage.rating - mean).abs() < 1e-9, "rating {} != {mean}", garage.rating);
    assert_eq!(store.list_garage_reviews(g.id).await.unwrap().len(), ratings.len());
}

#[tokio::test]
async fn deleting_a_vehicle_detaches_it_from_requests() {
    let Some(store) = pg_store().await else { return };
    let owner = account(&store, UserType::Customer).await;
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
    assert!(store.delete_vehicle(vehicle.id, owner.id).await.unwrap());
    let detached = store.find_request(request.id).await.unwrap().unwrap();
    assert_eq!(detached.vehicle_id, None);
}
