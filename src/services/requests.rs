use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::garage::Garage;
use crate::db::models::service_request::{
    ActorKind, CustomerRequests, NewServiceRequest, RequestEvent, RequestOwner, RequestStatus,
    RequestWithCustomer, ServiceRequest, StatusChange,
};
use crate::db::store::{ClaimOutcome, Store};
use crate::domain::geo::distance_km;
use crate::domain::lifecycle::{next_garage_step, transition};
use crate::domain::validation::{validate_new_request, ValidationErrors};
use crate::error::{AppError, AppResult};
use crate::services::profiles::CurrentUser;

/// How many of a customer's requests the dashboard shows.
pub const CUSTOMER_PAGE_SIZE: i64 = 10;

const NOT_FOUND: AppError = AppError::NotFound("Service request not found");

pub async fn create_request(
    store: &dyn Store,
    user: &CurrentUser,
    form: NewServiceRequest,
) -> AppResult<ServiceRequest> {
    let customer = user.customer()?;
    let record = validate_new_request(customer.id, &form)?;

    if let Some(vehicle_id) = record.vehicle_id {
        let owned = store
            .find_vehicle(vehicle_id)
            .await?
            .is_some_and(|v| v.profile_id == customer.id);
        if !owned {
            return Err(ValidationErrors::single("vehicle_id", "Please select one of your vehicles.").into());
        }
    }

    let request = store.insert_request(record, Utc::now()).await?;
    info!(
        "Customer {} created {:?} request {}",
        customer.id, request.service_type, request.id
    );
    Ok(request)
}

pub async fn customer_requests(store: &dyn Store, user: &CurrentUser) -> AppResult<CustomerRequests> {
    let customer = user.customer()?;
    let requests = store
        .list_customer_requests(customer.id, CUSTOMER_PAGE_SIZE)
        .await?;
    Ok(CustomerRequests::partition(requests))
}

/// Every pending request, with distances from the viewing garage when both
/// ends have coordinates.
pub async fn pending_requests(store: &dyn Store, user: &CurrentUser) -> AppResult<Vec<RequestWithCustomer>> {
    let garage = user.garage()?;
    let mut requests = store.list_pending_requests().await?;
    annotate_distances(garage, &mut requests);
    Ok(requests)
}

pub async fn assigned_requests(store: &dyn Store, user: &CurrentUser) -> AppResult<Vec<RequestWithCustomer>> {
    let garage = user.garage()?;
    let mut requests = store.list_open_garage_requests(garage.id).await?;
    annotate_distances(garage, &mut requests);
    Ok(requests)
}

fn annotate_distances(garage: &Garage, requests: &mut [RequestWithCustomer]) {
    let Some(origin) = garage.location() else {
        return;
    };
    for row in requests {
        row.distance_km = row.request.location().map(|point| distance_km(origin, point));
    }
}

/// Claim a pending request for the caller's garage. Exactly one of several
/// concurrent callers wins; the rest get a conflict.
pub async fn accept(store: &dyn Store, user: &CurrentUser, request_id: Uuid) -> AppResult<ServiceRequest> {
    let garage = user.garage()?;
    transition(RequestStatus::Pending, RequestStatus::Accepted, ActorKind::Garage)?;

    match store.claim_pending(request_id, garage.id, Utc::now()).await? {
        ClaimOutcome::Claimed(request) => {
            info!("Garage {} accepted request {}", garage.id, request.id);
            Ok(request)
        }
        ClaimOutcome::NotFound => Err(NOT_FOUND),
        ClaimOutcome::GarageUnavailable => Err(AppError::Conflict(
            "Your garage is offline. Go online to accept requests.",
        )),
        ClaimOutcome::AlreadyTaken => {
            warn!("Garage {} lost the race for request {request_id}", garage.id);
            Err(AppError::Conflict("This request has already been taken by another garage."))
        }
    }
}

/// Move a request to `target` on behalf of the caller.
pub async fn set_status(
    store: &dyn Store,
    user: &CurrentUser,
    request_id: Uuid,
    target: RequestStatus,
) -> AppResult<ServiceRequest> {
    let profile = user.profile()?;
    if target == RequestStatus::Accepted && profile.is_garage() {
        return accept(store, user, request_id).await;
    }

    let request = store.find_request(request_id).await?.ok_or(NOT_FOUND)?;
    let owner = owner_of(user, &request)?;
    let next = transition(request.status, target, owner.actor_kind())?;

    let change = StatusChange {
        request_id,
        owner,
        expected: request.status,
        next,
        at: Utc::now(),
    };
    let updated = store
        .change_status(change)
        .await?
        .ok_or(AppError::Conflict("The request status changed concurrently. Please refresh."))?;

    info!(
        "Request {} moved {} -> {} by {:?} {}",
        request_id,
        request.status,
        updated.status,
        owner.actor_kind(),
        owner.id()
    );
    Ok(updated)
}

/// The garage's single forward step from wherever the request is now.
pub async fn advance(store: &dyn Store, user: &CurrentUser, request_id: Uuid) -> AppResult<ServiceRequest> {
    user.garage()?;
    let request = store.find_request(request_id).await?.ok_or(NOT_FOUND)?;
    let Some(next) = next_garage_step(request.status) else {
        if !can_view(user, &request) {
            return Err(NOT_FOUND);
        }
        return Err(AppError::Conflict("This request is already finished"));
    };
    set_status(store, user, request_id, next).await
}

pub async fn cancel(store: &dyn Store, user: &CurrentUser, request_id: Uuid) -> AppResult<ServiceRequest> {
    user.customer()?;
    set_status(store, user, request_id, RequestStatus::Cancelled).await
}

pub async fn request_detail(store: &dyn Store, user: &CurrentUser, request_id: Uuid) -> AppResult<ServiceRequest> {
    let request = store.find_request(request_id).await?.ok_or(NOT_FOUND)?;
    if can_view(user, &request) {
        Ok(request)
    } else {
        Err(NOT_FOUND)
    }
}

pub async fn request_events(store: &dyn Store, user: &CurrentUser, request_id: Uuid) -> AppResult<Vec<RequestEvent>> {
    let request = request_detail(store, user, request_id).await?;
    Ok(store.list_request_events(request.id).await?)
}

/// Who the caller acts as on this request. Unrelated callers get a 404 so
/// request ids cannot be probed.
fn owner_of(user: &CurrentUser, request: &ServiceRequest) -> AppResult<RequestOwner> {
    let profile = user.profile()?;
    if profile.is_customer() {
        return if request.customer_id == profile.id {
            Ok(RequestOwner::Customer(profile.id))
        } else {
            Err(NOT_FOUND)
        };
    }

    let garage = user.garage()?;
    match request.garage_id {
        Some(id) if id == garage.id => Ok(RequestOwner::Garage(garage.id)),
        None if request.status == RequestStatus::Pending => {
            Err(AppError::Conflict("Accept the request before updating it."))
        }
        _ => Err(NOT_FOUND),
    }
}

fn can_view(user: &CurrentUser, request: &ServiceRequest) -> bool {
    let Some(profile) = user.resolved.profile.as_ref() else {
        return false;
    };
    if profile.is_customer() {
        return request.customer_id == profile.id;
    }
    match (&user.resolved.garage, request.garage_id) {
        (Some(garage), Some(assigned)) => garage.id == assigned,
        (Some(_), None) => request.status == RequestStatus::Pending,
        (None, _) => false,
    }
}
