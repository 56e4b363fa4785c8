use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Fetch, fallback, join::lookup_one};
use crate::{
    error::{AppError, AppResult},
    ids::{ChefId, SubscriptionId, UserId},
    models::{Chef, PlanType, Subscription, SubscriptionStatus, VerificationStatus},
    store::{Changes, DataService, Query},
};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SubscriptionLine {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub chef_name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubscriptionDraft {
    pub chef_id: ChefId,
    pub plan_type: PlanType,
}

fn status_change_allowed(from: SubscriptionStatus, to: SubscriptionStatus) -> bool {
    use SubscriptionStatus::*;
    matches!(
        (from, to),
        (Active, Paused) | (Paused, Active) | (Active, Cancelled) | (Paused, Cancelled)
    )
}

impl<S: DataService> Fetch<'_, S> {
    /// A customer's plans, newest first. Chef names go subscription -> chef -> profile.
    pub async fn customer_subscriptions(&self, customer: UserId) -> AppResult<Vec<SubscriptionLine>> {
        let subscriptions = self
            .store
            .select(
                Query::<Subscription>::new()
                    .eq("customer_id", customer)
                    .newest_first(),
            )
            .await?;

        let chefs = lookup_one(
            self.store,
            self.joins,
            "id",
            subscriptions.iter().map(|s| s.chef_id),
            |c: &Chef| c.id,
        )
        .await;
        let names = self.names(chefs.values().map(|c| c.user_id)).await;

        Ok(subscriptions
            .into_iter()
            .map(|subscription| SubscriptionLine {
                chef_name: chefs
                    .get(&subscription.chef_id)
                    .and_then(|chef| names.get(&chef.user_id))
                    .cloned()
                    .unwrap_or_else(|| fallback::CHEF.to_string()),
                subscription,
            })
            .collect())
    }

    /// Start a plan with an approved chef, priced at their cheapest available dish.
    pub async fn create_subscription(&self, customer: UserId, draft: SubscriptionDraft) -> AppResult<Subscription> {
        let chef = self.chef(draft.chef_id).await?;
        if chef.verification_status != VerificationStatus::Approved {
            return Err(AppError::validation("This chef isn't taking subscriptions yet"));
        }
        let price_per_meal = self
            .available_chef_meals(chef.user_id)
            .await?
            .into_iter()
            .map(|meal| meal.price)
            .min_by(f64::total_cmp)
            .ok_or_else(|| AppError::validation("This chef has no dishes to subscribe to"))?;

        let days = draft.plan_type.days();
        let meals_count = i32::try_from(days).unwrap_or(i32::MAX);
        let start_date = Utc::now().date_naive();
        let subscription = self
            .store
            .insert(Subscription {
                id: SubscriptionId::new(),
                customer_id: customer,
                chef_id: chef.id,
                plan_type: draft.plan_type,
                meals_count,
                meals_remaining: meals_count,
                price_per_meal,
                total_price: price_per_meal * f64::from(meals_count),
                start_date,
                end_date: start_date + Duration::days(days),
                status: SubscriptionStatus::Active,
                created_at: Utc::now(),
            })
            .await?;
        tracing::info!(subscription_id = %subscription.id, chef_id = %chef.id, "subscription started");
        Ok(subscription)
    }

    /// Pause, resume or cancel one of the customer's own plans.
    pub async fn set_subscription_status(
        &self,
        customer: UserId,
        id: SubscriptionId,
        status: SubscriptionStatus,
    ) -> AppResult<Subscription> {
        let current: Subscription = self.store.find(id.as_uuid()).await?;
        if current.customer_id != customer {
            return Err(AppError::Forbidden("This subscription belongs to someone else".into()));
        }
        if !status_change_allowed(current.status, status) {
            return Err(AppError::validation(format!(
                "Can't change a {} subscription to {}",
                current.status.as_str(),
                status.as_str()
            )));
        }
        self.store
            .update(id.as_uuid(), Changes::new().set("status", status.as_str()))
            .await
    }
}
