use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::PgStore;
use crate::db::models::service_request::{
    ActorKind, RequestEvent, RequestOwner, RequestStatus, RequestWithCustomer, ServiceRequest,
    ServiceRequestRecord, StatusChange,
};
use crate::db::store::{ClaimOutcome, RequestStore, StoreError};

const WITH_CUSTOMER: &str = r#"
    SELECT sr.*, p.full_name AS customer_name, p.phone AS customer_phone
    FROM service_requests sr
    JOIN profiles p ON p.id = sr.customer_id
"#;

async fn insert_event(
    tx: &mut Transaction<'_, Postgres>,
    request_id: Uuid,
    from_status: Option<RequestStatus>,
    to_status: RequestStatus,
    actor_kind: ActorKind,
    actor_id: Uuid,
    at: DateTime<Utc>,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO request_events (id, request_id, from_status, to_status, actor_kind, actor_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request_id)
    .bind(from_status)
    .bind(to_status)
    .bind(actor_kind)
    .bind(actor_id)
    .bind(at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl RequestStore for PgStore {
    async fn insert_request(
        &self,
        record: ServiceRequestRecord,
        at: DateTime<Utc>,
    ) -> Result<ServiceRequest, StoreError> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, ServiceRequest>(
            r#"
            INSERT INTO service_requests (
                id, customer_id, vehicle_id, service_type, status, address,
                latitude, longitude, problem_description, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.customer_id)
        .bind(record.vehicle_id)
        .bind(record.service_type)
        .bind(&record.address)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(&record.problem_description)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;

        insert_event(
            &mut tx,
            request.id,
            None,
            RequestStatus::Pending,
            ActorKind::Customer,
            request.customer_id,
            at,
        )
        .await?;

        tx.commit().await?;
        Ok(request)
    }

    async fn find_request(&self, request_id: Uuid) -> Result<Option<ServiceRequest>, StoreError> {
        let request = sqlx::query_as::<_, ServiceRequest>("SELECT * FROM service_requests WHERE id = $1")
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(request)
    }

    async fn list_customer_requests(
        &self,
        customer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ServiceRequest>, StoreError> {
        let requests = sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT * FROM service_requests
            WHERE customer_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn list_pending_requests(&self) -> Result<Vec<RequestWithCustomer>, StoreError> {
        let sql = format!("{WITH_CUSTOMER} WHERE sr.status = 'pending' ORDER BY sr.created_at DESC");
        let requests = sqlx::query_as::<_, RequestWithCustomer>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(requests)
    }

    async fn list_open_garage_requests(
        &self,
        garage_id: Uuid,
    ) -> Result<Vec<RequestWithCustomer>, StoreError> {
        let sql = format!(
            "{WITH_CUSTOMER} WHERE sr.garage_id = $1 AND sr.status NOT IN ('completed', 'cancelled') \
             ORDER BY sr.created_at DESC"
        );
        let requests = sqlx::query_as::<_, RequestWithCustomer>(&sql)
            .bind(garage_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(requests)
    }

    async fn claim_pending(
        &self,
        request_id: Uuid,
        garage_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests sr
            SET garage_id = $2, status = 'accepted', updated_at = $3
            WHERE sr.id = $1
              AND sr.status = 'pending'
              AND sr.garage_id IS NULL
              AND EXISTS (SELECT 1 FROM garages g WHERE g.id = $2 AND g.is_available)
            RETURNING sr.*
            "#,
        )
        .bind(request_id)
        .bind(garage_id)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(request) = claimed {
            insert_event(
                &mut tx,
                request.id,
                Some(RequestStatus::Pending),
                RequestStatus::Accepted,
                ActorKind::Garage,
                garage_id,
                at,
            )
            .await?;
            tx.commit().await?;
            return Ok(ClaimOutcome::Claimed(request));
        }
        tx.rollback().await?;

        // The write did not apply; work out why for the caller.
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM service_requests WHERE id = $1)")
            .bind(request_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Ok(ClaimOutcome::NotFound);
        }

        let available: Option<bool> = sqlx::query_scalar("SELECT is_available FROM garages WHERE id = $1")
            .bind(garage_id)
            .fetch_optional(&self.pool)
            .await?;
        if available != Some(true) {
            return Ok(ClaimOutcome::GarageUnavailable);
        }
        Ok(ClaimOutcome::AlreadyTaken)
    }

    async fn change_status(&self, change: StatusChange) -> Result<Option<ServiceRequest>, StoreError> {
        let owner_clause = match change.owner {
            RequestOwner::Customer(_) => "customer_id = $4",
            RequestOwner::Garage(_) => "garage_id = $4",
        };
        let sql = format!(
            r#"
            UPDATE service_requests
            SET status = $3, updated_at = $5, completed_at = COALESCE($6, completed_at)
            WHERE id = $1 AND status = $2 AND {owner_clause}
            RETURNING *
            "#
        );
        let completed_at = (change.next == RequestStatus::Completed).then_some(change.at);

        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, ServiceRequest>(&sql)
            .bind(change.request_id)
            .bind(change.expected)
            .bind(change.next)
            .bind(change.owner.id())
            .bind(change.at)
            .bind(completed_at)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(request) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        insert_event(
            &mut tx,
            request.id,
            Some(change.expected),
            change.next,
            change.owner.actor_kind(),
            change.owner.id(),
            change.at,
        )
        .await?;
        tx.commit().await?;
        Ok(Some(request))
    }

    async fn list_request_events(&self, request_id: Uuid) -> Result<Vec<RequestEvent>, StoreError> {
        let events = sqlx::query_as::<_, RequestEvent>(
            "SELECT * FROM request_events WHERE request_id = $1 ORDER BY seq ASC",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}
