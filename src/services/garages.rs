use tracing::info;

use crate::db::models::garage::{Garage, NewGarage};
use crate::db::store::{Store, StoreError};
use crate::domain::validation::validate_new_garage;
use crate::error::{AppError, AppResult};
use crate::services::profiles::CurrentUser;

/// Create the caller's garage. One garage per garage-type profile.
pub async fn setup_garage(store: &dyn Store, user: &CurrentUser, form: NewGarage) -> AppResult<Garage> {
    let profile = user.profile()?;
    if !profile.is_garage() {
        return Err(AppError::Forbidden("Only garage accounts can set up a garage"));
    }
    let record = validate_new_garage(profile.id, &form)?;

    match store.create_garage(record).await {
        Ok(garage) => {
            info!("Profile {} set up garage {} ({})", profile.id, garage.id, garage.garage_name);
            Ok(garage)
        }
        Err(StoreError::Conflict(_)) => Err(AppError::Conflict("Your garage is already set up")),
        Err(e) => Err(e.into()),
    }
}

pub async fn set_availability(store: &dyn Store, user: &CurrentUser, is_available: bool) -> AppResult<Garage> {
    let garage = user.garage()?;
    let updated = store
        .set_availability(garage.id, is_available)
        .await?
        .ok_or(AppError::NotFound("Garage not found"))?;
    info!(
        "Garage {} is now {}",
        updated.id,
        if updated.is_available { "online" } else { "offline" }
    );
    Ok(updated)
}
