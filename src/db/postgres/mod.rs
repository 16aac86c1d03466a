//! PostgreSQL adapter. Conditional writes are single `UPDATE … WHERE … RETURNING`
//! statements; multi-row effects run inside one transaction.

mod accounts;
mod garages;
mod requests;
mod reviews;
mod vehicles;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::store::{Store, StoreError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a unique-violation (SQLSTATE 23505) to [`StoreError::Conflict`].
fn unique_violation(err: sqlx::Error, what: &'static str) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().map(|code| code == "23505").unwrap_or(false) {
            return StoreError::Conflict(what);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}
