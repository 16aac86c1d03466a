//! Profile resolver: principal → person record and, for garage operators,
//! the garage record.

use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::garage::Garage;
use crate::db::models::profile::Profile;
use crate::db::store::Store;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ResolvedProfile {
    pub profile: Option<Profile>,
    pub garage: Option<Garage>,
}

/// Look up the profile and garage for `user_id`.
///
/// Lookup failures are logged and resolve to empty values so pages degrade
/// to their "not set up" state instead of failing.
pub async fn resolve_profile(store: &dyn Store, user_id: Uuid) -> ResolvedProfile {
    let profile = match store.find_profile_by_user(user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            error!("Error fetching profile for {user_id}: {e}");
            return ResolvedProfile::default();
        }
    };

    let garage = match &profile {
        Some(p) if p.is_garage() => match store.find_garage_by_profile(p.id).await {
            Ok(garage) => garage,
            Err(e) => {
                error!("Error fetching garage for profile {}: {e}", p.id);
                None
            }
        },
        _ => None,
    };

    ResolvedProfile { profile, garage }
}

/// The authenticated caller, as attached to each request by the middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub account_id: Uuid,
    pub resolved: ResolvedProfile,
}

impl CurrentUser {
    pub fn profile(&self) -> AppResult<&Profile> {
        self.resolved
            .profile
            .as_ref()
            .ok_or(AppError::NotFound("Profile not found. Please try again."))
    }

    pub fn customer(&self) -> AppResult<&Profile> {
        let profile = self.profile()?;
        if profile.is_customer() {
            Ok(profile)
        } else {
            Err(AppError::Forbidden("Only customers can do this"))
        }
    }

    pub fn garage(&self) -> AppResult<&Garage> {
        let profile = self.profile()?;
        if !profile.is_garage() {
            return Err(AppError::Forbidden("Only garages can do this"));
        }
        self.resolved
            .garage
            .as_ref()
            .ok_or(AppError::NotFound("Garage profile is not set up yet"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::models::account::UserType;
    use crate::db::models::profile::NewProfile;
    use crate::db::store::AccountStore;

    #[tokio::test]
    async fn unknown_principal_resolves_to_nothing() {
        let store = MemoryStore::new();
        let resolved = resolve_profile(&store, Uuid::new_v4()).await;
        assert!(resolved.profile.is_none());
        assert!(resolved.garage.is_none());
    }

    #[tokio::test]
    async fn garage_without_setup_has_no_garage_record() {
        let store = MemoryStore::new();
        let (account, _) = store
            .create_account(
                "g@example.com",
                "hash",
                NewProfile {
                    user_type: UserType::Garage,
                    full_name: "Ravi".into(),
                    phone: None,
                },
            )
            .await
            .unwrap();

        let user = CurrentUser {
            account_id: account.id,
            resolved: resolve_profile(&store, account.id).await,
        };
        assert!(user.resolved.profile.is_some());
        assert!(matches!(user.garage(), Err(AppError::NotFound(_))));
        assert!(matches!(user.customer(), Err(AppError::Forbidden(_))));
    }
}
