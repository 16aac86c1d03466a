use std::sync::Arc;

use crate::config::Config;
use crate::db::store::Store;
use crate::middleware::auth::{create_profile_cache, create_revoked_tokens, ProfileCache, RevokedTokens};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub profiles: ProfileCache,
    pub revoked_tokens: RevokedTokens,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            profiles: create_profile_cache(config.profile_cache_ttl),
            revoked_tokens: create_revoked_tokens(config.token_ttl),
            store,
            config: Arc::new(config),
        }
    }

    /// Drop the cached profile so the next request re-resolves it.
    pub fn forget_profile(&self, account_id: uuid::Uuid) {
        self.profiles.invalidate(&account_id);
    }
}
