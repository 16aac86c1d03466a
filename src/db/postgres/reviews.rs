use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{unique_violation, PgStore};
use crate::db::models::review::{Review, ReviewRecord};
use crate::db::store::{ReviewStore, StoreError};

#[async_trait]
impl ReviewStore for PgStore {
    async fn create_review(&self, record: ReviewRecord) -> Result<Review, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Serialises reviews of one garage so the aggregates below see every committed row.
        sqlx::query("SELECT 1 FROM garages WHERE id = $1 FOR UPDATE")
            .bind(record.garage_id)
            .fetch_optional(&mut *tx)
            .await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (id, customer_id, garage_id, service_request_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.customer_id)
        .bind(record.garage_id)
        .bind(record.service_request_id)
        .bind(record.rating)
        .bind(&record.comment)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "review"))?;

        sqlx::query(
            r#"
            UPDATE garages
            SET total_reviews = (SELECT COUNT(*)::int4 FROM reviews WHERE garage_id = $1),
                rating = (SELECT AVG(rating)::float8 FROM reviews WHERE garage_id = $1),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(record.garage_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(review)
    }

    async fn list_garage_reviews(&self, garage_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE garage_id = $1 ORDER BY created_at DESC",
        )
        .bind(garage_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }
}
