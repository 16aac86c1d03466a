use tracing::info;
use uuid::Uuid;

use crate::db::models::review::{NewReview, Review, ReviewRecord};
use crate::db::models::service_request::RequestStatus;
use crate::db::store::{Store, StoreError};
use crate::domain::validation::validate_rating;
use crate::error::{AppError, AppResult};
use crate::services::profiles::CurrentUser;

pub async fn create_review(
    store: &dyn Store,
    user: &CurrentUser,
    request_id: Uuid,
    form: NewReview,
) -> AppResult<Review> {
    let customer = user.customer()?;
    let rating = validate_rating(form.rating)?;

    let request = store
        .find_request(request_id)
        .await?
        .filter(|r| r.customer_id == customer.id)
        .ok_or(AppError::NotFound("Service request not found"))?;
    if request.status != RequestStatus::Completed {
        return Err(AppError::Conflict("Only completed requests can be reviewed"));
    }
    let garage_id = request
        .garage_id
        .ok_or_else(|| AppError::Internal(format!("completed request {request_id} has no garage")))?;

    let record = ReviewRecord {
        customer_id: customer.id,
        garage_id,
        service_request_id: request_id,
        rating,
        comment: form.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
    };
    match store.create_review(record).await {
        Ok(review) => {
            info!("Customer {} rated garage {garage_id} {rating}/5", customer.id);
            Ok(review)
        }
        Err(StoreError::Conflict(_)) => Err(AppError::Conflict("You have already reviewed this request")),
        Err(e) => Err(e.into()),
    }
}

pub async fn garage_reviews(store: &dyn Store, garage_id: Uuid) -> AppResult<Vec<Review>> {
    store
        .find_garage(garage_id)
        .await?
        .ok_or(AppError::NotFound("Garage not found"))?;
    Ok(store.list_garage_reviews(garage_id).await?)
}
