use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

use roadassist::api::auth::RegisterRequest;
use roadassist::client::{ApiClient, ClientError, CustomerDashboard, GarageDashboard, LoadState};
use roadassist::db::memory::MemoryStore;
use roadassist::db::models::account::UserType;
use roadassist::db::models::garage::NewGarage;
use roadassist::db::models::service_request::{GeoPoint, NewServiceRequest, RequestStatus, ServiceType};
use roadassist::db::models::vehicle::{NewVehicle, VehicleType};
use roadassist::{build_app, AppState, Config};

async fn spawn_server() -> String {
    let app = build_app(AppState::new(
        Arc::new(MemoryStore::new()),
        Config::for_tests("client-test-secret"),
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn signed_in(base_url: &str, email: &str, user_type: UserType) -> ApiClient {
    let mut client = ApiClient::new(base_url);
    client
        .register(&RegisterRequest {
            email: email.into(),
            password: "secret1".into(),
            full_name: "Test User".into(),
            user_type,
            phone: None,
        })
        .await
        .unwrap();
    let login = client.login(email, "secret1").await.unwrap();
    assert_eq!(login.user_type, user_type);
    client
}

#[tokio::test]
async fn dashboards_follow_a_request_through_its_lifecycle() {
    let base_url = spawn_server().await;
    let customer = signed_in(&base_url, "customer@example.com", UserType::Customer).await;
    let garage = signed_in(&base_url, "garage@example.com", UserType::Garage).await;

    let mut garage_view = GarageDashboard::new();
    garage_view.refresh(&garage).await;
    assert!(garage_view.needs_setup());
    assert!(matches!(garage_view.pending, LoadState::NotStarted));

    garage
        .setup_garage(&NewGarage {
            garage_name: "Highway Helpers".into(),
            description: Some("24x7".into()),
            address: "NH 44".into(),
            location: Some(GeoPoint { lat: 17.385, lng: 78.4867 }),
            services_offered: vec![ServiceType::Towing, ServiceType::Battery],
            vehicle_types_serviced: vec![VehicleType::Car, VehicleType::Truck],
        })
        .await
        .unwrap();

    let vehicle = customer
        .add_vehicle(&NewVehicle {
            vehicle_type: Some(VehicleType::Car),
            brand: "Tata".into(),
            model: "Nexon".into(),
            registration_number: None,
        })
        .await
        .unwrap();
    let request = customer
        .create_request(&NewServiceRequest {
            service_type: Some(ServiceType::Battery),
            problem_description: Some("Won't start".into()),
            location: Some(GeoPoint { lat: 17.44, lng: 78.35 }),
            address: None,
            vehicle_id: Some(vehicle.id),
        })
        .await
        .unwrap();

    let mut customer_view = CustomerDashboard::new();
    customer_view.refresh(&customer).await;
    let requests = customer_view.requests.data().unwrap();
    assert_eq!(requests.active.len(), 1);
    assert_eq!(customer_view.vehicles.data().map(Vec::len), Some(1));

    garage_view.refresh(&garage).await;
    assert!(!garage_view.needs_setup());
    assert_eq!(garage_view.is_available(), Some(true));
    let pending = garage_view.pending.data().unwrap();
    assert_eq!(pending.len(), 1);
    assert!(pending[0].distance_km.is_some());

    let accepted = garage_view.accept(&garage, request.id).await.unwrap();
    assert_eq!(accepted.status, RequestStatus::Accepted);
    assert!(garage_view.pending.data().unwrap().is_empty());
    assert_eq!(garage_view.assigned.data().unwrap().len(), 1);

    for _ in 0..3 {
        garage_view.advance(&garage, request.id).await.unwrap();
    }
    assert!(garage_view.assigned.data().unwrap().is_empty());

    customer_view.refresh(&customer).await;
    let requests = customer_view.requests.data().unwrap();
    assert!(requests.active.is_empty());
    assert_eq!(requests.past[0].status, RequestStatus::Completed);

    let fetched = assert_ok!(customer.get_request(request.id).await);
    assert_eq!(fetched.status, RequestStatus::Completed);
    assert!(fetched.completed_at.is_some());
}

#[tokio::test]
async fn server_errors_surface_as_typed_client_errors() {
    let base_url = spawn_server().await;
    let customer = signed_in(&base_url, "c@example.com", UserType::Customer).await;

    let err = customer
        .create_request(&NewServiceRequest {
            address: Some("MG Road".into()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
    assert!(err.field_error("service_type").is_some());

    let mut view = CustomerDashboard::new();
    let request = customer
        .create_request(&NewServiceRequest {
            service_type: Some(ServiceType::Towing),
            address: Some("MG Road".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let cancelled = view.cancel(&customer, request.id).await.unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);
    assert_eq!(view.requests.data().unwrap().past.len(), 1);

    let err = assert_err!(view.cancel(&customer, request.id).await);
    assert!(matches!(err, ClientError::Api { .. }));
    assert_eq!(err.status().map(|s| s.as_u16()), Some(409));
}

#[tokio::test]
async fn garage_toggles_availability_and_signs_out() {
    let base_url = spawn_server().await;
    let mut garage = signed_in(&base_url, "g@example.com", UserType::Garage).await;
    garage
        .setup_garage(&NewGarage {
            garage_name: "Corner Garage".into(),
            description: None,
            address: "1st Cross".into(),
            location: None,
            services_offered: vec![ServiceType::Puncture],
            vehicle_types_serviced: vec![],
        })
        .await
        .unwrap();

    let mut view = GarageDashboard::new();
    view.refresh(&garage).await;
    assert!(!view.toggle_availability(&garage).await.unwrap());
    assert_eq!(view.is_available(), Some(false));

    let me = garage.me().await.unwrap();
    assert_eq!(me.garage.map(|g| g.is_available), Some(false));

    assert_ok!(garage.logout().await);
    assert!(matches!(garage.me().await.unwrap_err(), ClientError::NotSignedIn));
}
