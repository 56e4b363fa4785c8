use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Fetch, fallback, optional};
use crate::{
    error::{AppError, AppResult},
    ids::{ChefId, OrderId, ReviewId, UserId},
    models::{OrderStatus, Review},
    store::{Changes, DataService, Query},
};

pub const CHEF_PAGE_REVIEWS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReviewLine {
    #[serde(flatten)]
    pub review: Review,
    pub customer_name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewDraft {
    pub rating: i32,
    pub comment: Option<String>,
}

impl<S: DataService> Fetch<'_, S> {
    /// The latest reviews of a chef with reviewer names.
    pub async fn chef_reviews(&self, chef: ChefId, limit: u64) -> AppResult<Vec<ReviewLine>> {
        let reviews = self
            .store
            .select(
                Query::<Review>::new()
                    .eq("chef_id", chef)
                    .newest_first()
                    .limit(limit),
            )
            .await?;
        let names = self.names(reviews.iter().map(|r| r.customer_id)).await;
        Ok(reviews
            .into_iter()
            .map(|review| ReviewLine {
                customer_name: names
                    .get(&review.customer_id)
                    .cloned()
                    .unwrap_or_else(|| fallback::CUSTOMER.to_string()),
                review,
            })
            .collect())
    }

    pub async fn customer_reviews(&self, customer: UserId) -> AppResult<Vec<Review>> {
        self.store
            .select(Query::<Review>::new().eq("customer_id", customer))
            .await
    }

    /// One review per delivered order, by the customer who placed it.
    pub async fn submit_review(&self, customer: UserId, order_id: OrderId, draft: ReviewDraft) -> AppResult<Review> {
        if draft.rating == 0 {
            return Err(AppError::validation("Please select a rating"));
        }
        if !(1..=5).contains(&draft.rating) {
            return Err(AppError::validation("Rating must be between 1 and 5"));
        }

        let order = self.order(order_id).await?;
        if order.customer_id != customer {
            return Err(AppError::Forbidden("You can only review your own orders".into()));
        }
        if order.status != OrderStatus::Delivered {
            return Err(AppError::validation("Only delivered orders can be reviewed"));
        }
        let existing = self
            .store
            .select_one(Query::<Review>::new().eq("order_id", order_id))
            .await?;
        if existing.is_some() {
            return Err(AppError::validation("You already reviewed this order"));
        }

        // Orders point at the chef's user; reviews point at the chef profile.
        let chef = self
            .chef_for_user(order.chef_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let review = self
            .store
            .insert(Review {
                id: ReviewId::new(),
                order_id,
                customer_id: customer,
                chef_id: chef.id,
                rating: draft.rating,
                comment: optional(draft.comment),
                created_at: Utc::now(),
            })
            .await?;
        tracing::info!(review_id = %review.id, chef_id = %chef.id, rating = review.rating, "review submitted");

        if let Err(err) = self.refresh_rating(chef.id).await {
            tracing::warn!(chef_id = %chef.id, error = %err, "chef rating not refreshed");
        }
        Ok(review)
    }

    async fn refresh_rating(&self, chef: ChefId) -> AppResult<()> {
        let reviews = self
            .store
            .select(Query::<Review>::new().eq("chef_id", chef))
            .await?;
        let total = reviews.len();
        let avg = if total == 0 {
            0.0
        } else {
            reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / total as f64
        };
        let changes = Changes::new()
            .set("avg_rating", (avg * 10.0).round() / 10.0)
            .set("total_reviews", i32::try_from(total).unwrap_or(i32::MAX));
        self.store
            .update::<crate::models::Chef>(chef.as_uuid(), changes)
            .await?;
        Ok(())
    }
}
