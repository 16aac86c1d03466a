//! Use cases. Each function takes the store port and the resolved caller,
//! enforces ownership and role rules, and returns an [`AppResult`].
//!
//! [`AppResult`]: crate::error::AppResult

pub mod auth;
pub mod garages;
pub mod profiles;
pub mod requests;
pub mod reviews;
pub mod vehicles;

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::db::memory::MemoryStore;
    use crate::db::models::account::UserType;
    use crate::db::models::garage::GarageRecord;
    use crate::db::models::profile::NewProfile;
    use crate::db::models::service_request::{GeoPoint, ServiceType};
    use crate::db::models::vehicle::{Vehicle, VehicleRecord, VehicleType};
    use crate::db::store::{AccountStore, GarageStore, VehicleStore};
    use crate::services::profiles::{resolve_profile, CurrentUser};

    async fn account(store: &MemoryStore, email: &str, user_type: UserType, name: &str) -> CurrentUser {
        let (account, _) = store
            .create_account(
                email,
                "not-a-real-hash",
                NewProfile {
                    user_type,
                    full_name: name.into(),
                    phone: Some("9876543210".into()),
                },
            )
            .await
            .unwrap();
        CurrentUser {
            account_id: account.id,
            resolved: resolve_profile(store, account.id).await,
        }
    }

    pub async fn customer(store: &MemoryStore, email: &str) -> CurrentUser {
        account(store, email, UserType::Customer, "Customer").await
    }

    /// A garage-type account that has not set up its garage yet.
    pub async fn garage_account(store: &MemoryStore, email: &str) -> CurrentUser {
        account(store, email, UserType::Garage, "Operator").await
    }

    pub async fn garage(store: &MemoryStore, email: &str, location: Option<GeoPoint>) -> CurrentUser {
        let user = garage_account(store, email).await;
        let profile_id = user.resolved.profile.as_ref().unwrap().id;
        store
            .create_garage(GarageRecord {
                profile_id,
                garage_name: format!("Garage {email}"),
                description: None,
                address: "Ring road".into(),
                latitude: location.map(|p| p.lat),
                longitude: location.map(|p| p.lng),
                services_offered: vec![ServiceType::Puncture],
                vehicle_types_serviced: vec![VehicleType::Car],
            })
            .await
            .unwrap();
        CurrentUser {
            account_id: user.account_id,
            resolved: resolve_profile(store, user.account_id).await,
        }
    }

    pub async fn vehicle(store: &MemoryStore, owner: &CurrentUser) -> Vehicle {
        store
            .create_vehicle(VehicleRecord {
                profile_id: owner.resolved.profile.as_ref().unwrap().id,
                vehicle_type: VehicleType::Car,
                brand: "Maruti".into(),
                model: "Swift".into(),
                registration_number: Some("KA01AB1234".into()),
            })
            .await
            .unwrap()
    }
}
