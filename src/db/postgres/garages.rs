use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{unique_violation, PgStore};
use crate::db::models::garage::{Garage, GarageRecord};
use crate::db::store::{GarageStore, StoreError};

#[async_trait]
impl GarageStore for PgStore {
    async fn create_garage(&self, record: GarageRecord) -> Result<Garage, StoreError> {
        let now = Utc::now();
        let garage = sqlx::query_as::<_, Garage>(
            r#"
            INSERT INTO garages (
                id, profile_id, garage_name, description, address, latitude, longitude,
                services_offered, vehicle_types_serviced, is_available, rating, total_reviews,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, 0, 0, $10, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.profile_id)
        .bind(&record.garage_name)
        .bind(&record.description)
        .bind(&record.address)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(&record.services_offered)
        .bind(&record.vehicle_types_serviced)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "garage"))?;

        Ok(garage)
    }

    async fn find_garage(&self, garage_id: Uuid) -> Result<Option<Garage>, StoreError> {
        let garage = sqlx::query_as::<_, Garage>("SELECT * FROM garages WHERE id = $1")
            .bind(garage_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(garage)
    }

    async fn find_garage_by_profile(&self, profile_id: Uuid) -> Result<Option<Garage>, StoreError> {
        let garage = sqlx::query_as::<_, Garage>("SELECT * FROM garages WHERE profile_id = $1")
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(garage)
    }

    async fn set_availability(
        &self,
        garage_id: Uuid,
        is_available: bool,
    ) -> Result<Option<Garage>, StoreError> {
        let garage = sqlx::query_as::<_, Garage>(
            r#"
            UPDATE garages
            SET is_available = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(garage_id)
        .bind(is_available)
        .fetch_optional(&self.pool)
        .await?;
        Ok(garage)
    }
}
