use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{unique_violation, PgStore};
use crate::db::models::account::Account;
use crate::db::models::profile::{NewProfile, Profile};
use crate::db::store::{AccountStore, ProfileStore, StoreError};

#[async_trait]
impl AccountStore for PgStore {
    async fn create_account(
        &self,
        email: &str,
        password_hash: &str,
        profile: NewProfile,
    ) -> Result<(Account, Profile), StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "email"))?;

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, user_id, user_type, full_name, phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account.id)
        .bind(profile.user_type)
        .bind(&profile.full_name)
        .bind(&profile.phone)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((account, profile))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn find_profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }
}
