use uuid::Uuid;

use super::{ApiClient, ClientError, LoadState};
use crate::db::models::service_request::{CustomerRequests, RequestWithCustomer, ServiceRequest};
use crate::db::models::vehicle::Vehicle;
use crate::services::profiles::ResolvedProfile;

/// Data behind the customer's home page.
#[derive(Debug, Default)]
pub struct CustomerDashboard {
    pub requests: LoadState<CustomerRequests>,
    pub vehicles: LoadState<Vec<Vehicle>>,
}

impl CustomerDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn refresh(&mut self, client: &ApiClient) {
        self.requests.begin();
        self.vehicles.begin();
        let (requests, vehicles) = tokio::join!(client.my_requests(), client.vehicles());
        self.requests.finish(requests);
        self.vehicles.finish(vehicles);
    }

    pub async fn cancel(&mut self, client: &ApiClient, request_id: Uuid) -> Result<ServiceRequest, ClientError> {
        let cancelled = client.cancel_request(request_id).await?;
        self.requests.load(client.my_requests()).await;
        Ok(cancelled)
    }
}

/// Data behind the garage's home page.
#[derive(Debug, Default)]
pub struct GarageDashboard {
    pub profile: LoadState<ResolvedProfile>,
    pub pending: LoadState<Vec<RequestWithCustomer>>,
    pub assigned: LoadState<Vec<RequestWithCustomer>>,
}

impl GarageDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The account is a garage account whose garage has not been set up.
    /// Only meaningful once the profile has loaded.
    pub fn needs_setup(&self) -> bool {
        self.profile
            .data()
            .is_some_and(|resolved| resolved.garage.is_none())
    }

    pub fn is_available(&self) -> Option<bool> {
        self.profile.data()?.garage.as_ref().map(|g| g.is_available)
    }

    pub async fn refresh(&mut self, client: &ApiClient) {
        self.profile.load(client.me()).await;
        if self.needs_setup() || self.profile.data().is_none() {
            return;
        }
        self.reload_lists(client).await;
    }

    async fn reload_lists(&mut self, client: &ApiClient) {
        self.pending.begin();
        self.assigned.begin();
        let (pending, assigned) = tokio::join!(client.pending_requests(), client.assigned_requests());
        self.pending.finish(pending);
        self.assigned.finish(assigned);
    }

    pub async fn accept(&mut self, client: &ApiClient, request_id: Uuid) -> Result<ServiceRequest, ClientError> {
        let result = client.accept_request(request_id).await;
        // Reload either way: a lost race means the pending list is stale.
        self.reload_lists(client).await;
        result
    }

    pub async fn advance(&mut self, client: &ApiClient, request_id: Uuid) -> Result<ServiceRequest, ClientError> {
        let updated = client.advance_request(request_id).await?;
        self.assigned.load(client.assigned_requests()).await;
        Ok(updated)
    }

    pub async fn toggle_availability(&mut self, client: &ApiClient) -> Result<bool, ClientError> {
        let next = !self.is_available().unwrap_or(false);
        let garage = client.set_availability(next).await?;
        if let LoadState::Succeeded(resolved) = &mut self.profile {
            resolved.garage = Some(garage.clone());
        }
        Ok(garage.is_available)
    }
}
