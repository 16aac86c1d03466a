use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::PgStore;
use crate::db::models::vehicle::{Vehicle, VehicleRecord};
use crate::db::store::{StoreError, VehicleStore};

#[async_trait]
impl VehicleStore for PgStore {
    async fn create_vehicle(&self, record: VehicleRecord) -> Result<Vehicle, StoreError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, profile_id, vehicle_type, brand, model, registration_number, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.profile_id)
        .bind(record.vehicle_type)
        .bind(&record.brand)
        .bind(&record.model)
        .bind(&record.registration_number)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(vehicle)
    }

    async fn list_vehicles(&self, profile_id: Uuid) -> Result<Vec<Vehicle>, StoreError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE profile_id = $1 ORDER BY created_at DESC",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    async fn find_vehicle(&self, vehicle_id: Uuid) -> Result<Option<Vehicle>, StoreError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(vehicle_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    async fn delete_vehicle(&self, vehicle_id: Uuid, profile_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1 AND profile_id = $2")
            .bind(vehicle_id)
            .bind(profile_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
