//! Field-scoped validation of incoming forms.
//!
//! Each validator either returns the cleaned record or a [`ValidationErrors`]
//! map keyed by field name. Nothing here touches the store.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::db::models::garage::{GarageRecord, NewGarage};
use crate::db::models::service_request::{NewServiceRequest, ServiceRequestRecord};
use crate::db::models::vehicle::{NewVehicle, VehicleRecord};
use crate::domain::geo;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate a customer's request form.
pub fn validate_new_request(
    customer_id: Uuid,
    form: &NewServiceRequest,
) -> Result<ServiceRequestRecord, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if form.service_type.is_none() {
        errors.add("service_type", "Please select a service type.");
    }

    let address = non_blank(form.address.as_deref());
    match form.location {
        Some(point) if !geo::is_valid(point) => {
            errors.add("location", "Captured location is out of range.");
        }
        None if address.is_none() => {
            errors.add("location", "Please provide your location or address.");
        }
        _ => {}
    }

    let Some(service_type) = form.service_type else {
        return Err(errors);
    };

    // Manual addresses fall back to 0,0 coordinates.
    let (latitude, longitude, address) = match form.location {
        Some(point) => (
            point.lat,
            point.lng,
            Some(address.unwrap_or_else(|| geo::describe(point))),
        ),
        None => (0.0, 0.0, address),
    };

    errors.into_result(|| ServiceRequestRecord {
        customer_id,
        vehicle_id: form.vehicle_id,
        service_type,
        address,
        latitude,
        longitude,
        problem_description: non_blank(form.problem_description.as_deref()),
    })
}

pub fn validate_new_vehicle(
    profile_id: Uuid,
    form: &NewVehicle,
) -> Result<VehicleRecord, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let brand = non_blank(Some(&form.brand));
    let model = non_blank(Some(&form.model));

    if form.vehicle_type.is_none() {
        errors.add("vehicle_type", "Please select a vehicle type.");
    }
    if brand.is_none() {
        errors.add("brand", "Brand is required.");
    }
    if model.is_none() {
        errors.add("model", "Model is required.");
    }

    match (form.vehicle_type, brand, model) {
        (Some(vehicle_type), Some(brand), Some(model)) => Ok(VehicleRecord {
            profile_id,
            vehicle_type,
            brand,
            model,
            registration_number: non_blank(form.registration_number.as_deref()),
        }),
        _ => Err(errors),
    }
}

pub fn validate_new_garage(
    profile_id: Uuid,
    form: &NewGarage,
) -> Result<GarageRecord, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let name = non_blank(Some(&form.garage_name));
    let address = non_blank(Some(&form.address));

    if name.is_none() {
        errors.add("garage_name", "Please enter your garage name.");
    }
    if address.is_none() {
        errors.add("address", "Please enter your garage address.");
    }
    if form.services_offered.is_empty() {
        errors.add("services_offered", "Please select at least one service.");
    }
    if let Some(point) = form.location {
        if !geo::is_valid(point) {
            errors.add("location", "Garage location is out of range.");
        }
    }

    let services = unique(&form.services_offered);
    let vehicles = unique(&form.vehicle_types_serviced);

    match (name, address) {
        (Some(garage_name), Some(address)) => errors.into_result(|| GarageRecord {
            profile_id,
            garage_name,
            description: non_blank(form.description.as_deref()),
            address,
            latitude: form.location.map(|p| p.lat),
            longitude: form.location.map(|p| p.lng),
            services_offered: services,
            vehicle_types_serviced: vehicles,
        }),
        _ => Err(errors),
    }
}

/// Sign-up form checks. Returns the normalized (trimmed, lower-cased) email.
pub fn validate_registration(
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<String, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let email = email.trim().to_lowercase();

    if !looks_like_email(&email) {
        errors.add("email", "Please enter a valid email address");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password", "Password must be at least 6 characters");
    }
    if full_name.trim().chars().count() < MIN_NAME_LEN {
        errors.add("full_name", "Name must be at least 2 characters");
    }

    errors.into_result(|| email)
}

pub fn validate_rating(rating: i32) -> Result<i32, ValidationErrors> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(ValidationErrors::single("rating", "Rating must be between 1 and 5."))
    }
}

fn unique<T: Copy + PartialEq>(items: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(*item);
        }
    }
    out
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
