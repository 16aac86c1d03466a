//! Typed HTTP client for the API, plus the load-state view models a
//! frontend builds its pages from.

mod dashboard;
mod load_state;

pub use dashboard::{CustomerDashboard, GarageDashboard};
pub use load_state::LoadState;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::auth::{LoginRequest, LoginResponse, RegisterRequest};
use crate::db::models::garage::{AvailabilityUpdate, Garage, NewGarage};
use crate::db::models::profile::Profile;
use crate::db::models::review::{NewReview, Review};
use crate::db::models::service_request::{
    CustomerRequests, NewServiceRequest, RequestEvent, RequestStatus, RequestWithCustomer,
    ServiceRequest, StatusUpdate,
};
use crate::db::models::vehicle::{NewVehicle, Vehicle};
use crate::services::profiles::ResolvedProfile;
use crate::utils::api_response::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error envelope.
    #[error("{message} ({status})")]
    Api {
        status: StatusCode,
        message: String,
        errors: Option<Value>,
    },

    #[error("response from {0} carried no data")]
    MissingData(String),

    #[error("not signed in")]
    NotSignedIn,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Message for a single form field, when the server rejected the input.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        match self {
            ClientError::Api { errors: Some(errors), .. } => errors.get(field)?.as_str(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        if self.token.is_none() {
            return Err(ClientError::NotSignedIn);
        }
        Ok(self.request(method, path))
    }

    async fn envelope<T: DeserializeOwned>(builder: RequestBuilder) -> Result<ApiResponse<T>, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ApiResponse<T>>(&body) {
            Ok(envelope) if envelope.success => Ok(envelope),
            Ok(envelope) => Err(ClientError::Api {
                status,
                message: envelope.message,
                errors: envelope.errors,
            }),
            // Unknown routes and the tower layers (body limit, timeout) answer in plain text.
            Err(_) if !status.is_success() => Err(ClientError::Api {
                status,
                message: body,
                errors: None,
            }),
            Err(e) => Err(ClientError::Api {
                status,
                message: format!("unexpected response body: {e}"),
                errors: Some(json!({ "body": body })),
            }),
        }
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder, what: &str) -> Result<T, ClientError> {
        Self::envelope::<T>(builder)
            .await?
            .data
            .ok_or_else(|| ClientError::MissingData(what.to_string()))
    }

    async fn send_unit(builder: RequestBuilder) -> Result<(), ClientError> {
        Self::envelope::<Value>(builder).await.map(|_| ())
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        builder: RequestBuilder,
        body: &B,
        what: &str,
    ) -> Result<T, ClientError> {
        Self::send(builder.json(body), what).await
    }

    pub async fn register(&self, form: &RegisterRequest) -> Result<Profile, ClientError> {
        Self::send_json(self.request(Method::POST, "/auth/register"), form, "register").await
    }

    /// Sign in and keep the token for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let form = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let login: LoginResponse =
            Self::send_json(self.request(Method::POST, "/auth/login"), &form, "login").await?;
        self.token = Some(login.token.clone());
        Ok(login)
    }

    pub async fn logout(&mut self) -> Result<(), ClientError> {
        Self::send_unit(self.authed(Method::POST, "/auth/logout")?).await?;
        self.token = None;
        Ok(())
    }

    pub async fn me(&self) -> Result<ResolvedProfile, ClientError> {
        Self::send(self.authed(Method::GET, "/profile/me")?, "profile").await
    }

    pub async fn setup_garage(&self, form: &NewGarage) -> Result<Garage, ClientError> {
        Self::send_json(self.authed(Method::POST, "/garages")?, form, "garage setup").await
    }

    pub async fn set_availability(&self, is_available: bool) -> Result<Garage, ClientError> {
        let body = AvailabilityUpdate { is_available };
        Self::send_json(self.authed(Method::PATCH, "/garages/me/availability")?, &body, "availability").await
    }

    pub async fn garage_reviews(&self, garage_id: Uuid) -> Result<Vec<Review>, ClientError> {
        Self::send(self.authed(Method::GET, &format!("/garages/{garage_id}/reviews"))?, "reviews").await
    }

    pub async fn vehicles(&self) -> Result<Vec<Vehicle>, ClientError> {
        Self::send(self.authed(Method::GET, "/vehicles")?, "vehicles").await
    }

    pub async fn add_vehicle(&self, form: &NewVehicle) -> Result<Vehicle, ClientError> {
        Self::send_json(self.authed(Method::POST, "/vehicles")?, form, "vehicle").await
    }

    pub async fn delete_vehicle(&self, vehicle_id: Uuid) -> Result<(), ClientError> {
        Self::send_unit(self.authed(Method::DELETE, &format!("/vehicles/{vehicle_id}"))?).await
    }

    pub async fn create_request(&self, form: &NewServiceRequest) -> Result<ServiceRequest, ClientError> {
        Self::send_json(self.authed(Method::POST, "/requests")?, form, "service request").await
    }

    pub async fn my_requests(&self) -> Result<CustomerRequests, ClientError> {
        Self::send(self.authed(Method::GET, "/requests/mine")?, "customer requests").await
    }

    pub async fn pending_requests(&self) -> Result<Vec<RequestWithCustomer>, ClientError> {
        Self::send(self.authed(Method::GET, "/requests/pending")?, "pending requests").await
    }

    pub async fn assigned_requests(&self) -> Result<Vec<RequestWithCustomer>, ClientError> {
        Self::send(self.authed(Method::GET, "/requests/assigned")?, "assigned requests").await
    }

    pub async fn get_request(&self, request_id: Uuid) -> Result<ServiceRequest, ClientError> {
        Self::send(self.authed(Method::GET, &format!("/requests/{request_id}"))?, "service request").await
    }

    pub async fn request_events(&self, request_id: Uuid) -> Result<Vec<RequestEvent>, ClientError> {
        Self::send(self.authed(Method::GET, &format!("/requests/{request_id}/events"))?, "events").await
    }

    pub async fn accept_request(&self, request_id: Uuid) -> Result<ServiceRequest, ClientError> {
        Self::send(self.authed(Method::POST, &format!("/requests/{request_id}/accept"))?, "accept").await
    }

    pub async fn set_status(&self, request_id: Uuid, status: RequestStatus) -> Result<ServiceRequest, ClientError> {
        let body = StatusUpdate { status };
        let builder = self.authed(Method::PATCH, &format!("/requests/{request_id}/status"))?;
        Self::send_json(builder, &body, "status update").await
    }

    pub async fn advance_request(&self, request_id: Uuid) -> Result<ServiceRequest, ClientError> {
        Self::send(self.authed(Method::POST, &format!("/requests/{request_id}/advance"))?, "advance").await
    }

    pub async fn cancel_request(&self, request_id: Uuid) -> Result<ServiceRequest, ClientError> {
        Self::send(self.authed(Method::POST, &format!("/requests/{request_id}/cancel"))?, "cancel").await
    }

    pub async fn review_request(&self, request_id: Uuid, form: &NewReview) -> Result<Review, ClientError> {
        let builder = self.authed(Method::POST, &format!("/requests/{request_id}/review"))?;
        Self::send_json(builder, form, "review").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn authed_calls_need_a_token() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let err = client.my_requests().await.unwrap_err();
        assert!(matches!(err, ClientError::NotSignedIn));
    }

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:3000/").with_token("abc");
        assert_eq!(client.base_url, "http://localhost:3000");
        assert_eq!(client.token(), Some("abc"));
    }

    #[test]
    fn field_errors_come_from_the_envelope() {
        let err = ClientError::Api {
            status: StatusCode::BAD_REQUEST,
            message: "Validation failed".into(),
            errors: Some(json!({ "service_type": "Please select a service type." })),
        };
        assert_eq!(err.field_error("service_type"), Some("Please select a service type."));
        assert_eq!(err.field_error("location"), None);
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }
}
