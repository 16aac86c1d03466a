use tracing::info;
use uuid::Uuid;

use crate::db::models::vehicle::{NewVehicle, Vehicle};
use crate::db::store::Store;
use crate::domain::validation::validate_new_vehicle;
use crate::error::{AppError, AppResult};
use crate::services::profiles::CurrentUser;

pub async fn add_vehicle(store: &dyn Store, user: &CurrentUser, form: NewVehicle) -> AppResult<Vehicle> {
    let customer = user.customer()?;
    let record = validate_new_vehicle(customer.id, &form)?;
    let vehicle = store.create_vehicle(record).await?;
    info!("Customer {} added vehicle {}", customer.id, vehicle.id);
    Ok(vehicle)
}

pub async fn list_vehicles(store: &dyn Store, user: &CurrentUser) -> AppResult<Vec<Vehicle>> {
    let customer = user.customer()?;
    Ok(store.list_vehicles(customer.id).await?)
}

/// Only the owner can delete; anything else looks like a missing vehicle.
pub async fn delete_vehicle(store: &dyn Store, user: &CurrentUser, vehicle_id: Uuid) -> AppResult<()> {
    let customer = user.customer()?;
    if store.delete_vehicle(vehicle_id, customer.id).await? {
        info!("Customer {} deleted vehicle {vehicle_id}", customer.id);
        Ok(())
    } else {
        Err(AppError::NotFound("Vehicle not found"))
    }
}
