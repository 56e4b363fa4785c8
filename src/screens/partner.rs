use serde::Serialize;
use utoipa::ToSchema;

use super::{Screens, after_action, settle};
use crate::{
    aggregate::{EarningsReport, PartnerStats, earnings_by_date, partner_stats},
    error::AppResult,
    fetchers::{ChefProfileUpdate, MealDraft, OrderLine},
    ids::{MealId, OrderId, UserId},
    models::{Actor, Chef, Meal, OrderStatus},
    store::DataService,
    view::{Notice, Redirect, Route, Screen, ScreenState},
};

pub const PARTNER_LOAD_FAILED: &str = "Failed to load partner dashboard";

/// The chef back office: stats, dishes, incoming orders, earnings and profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct PartnerView {
    pub chef: Option<Chef>,
    pub stats: PartnerStats,
    pub dishes: Vec<Meal>,
    pub orders: Vec<OrderLine>,
    pub earnings: EarningsReport,
    pub specialties: Vec<String>,
    pub notice: Option<Notice>,
}

super::impl_view!(PartnerView);

type Gate<T> = Result<T, Screen<PartnerView>>;

impl<S: DataService> Screens<'_, S> {
    /// Authoritative chef check, then the chef profile (created on first visit).
    async fn partner_gate(&self) -> Gate<(UserId, Chef)> {
        let grant = self
            .roles()
            .require_chef(self.identity().as_ref())
            .await
            .map_err(Screen::Redirect)?;
        match self.fetch().ensure_chef_profile(grant.user_id()).await {
            Ok(chef) => Ok((grant.user_id(), chef)),
            Err(err) => {
                tracing::error!(error = %err, "chef profile unavailable");
                Err(Screen::Redirect(Redirect::with_notice(
                    Route::Home,
                    Notice::error(PARTNER_LOAD_FAILED),
                )))
            }
        }
    }

    async fn load_partner(&self, user: UserId, chef: Chef) -> AppResult<PartnerView> {
        let fetch = self.fetch();
        let (stats, dishes, orders, specialties) = tokio::join!(
            partner_stats(fetch.store(), user),
            fetch.chef_meals(user),
            fetch.chef_orders(user),
            fetch.specialties(chef.id),
        );
        let orders = orders?;
        let plain: Vec<_> = orders.iter().map(|line| line.order.clone()).collect();

        Ok(PartnerView {
            chef: Some(chef),
            stats: stats?,
            dishes: dishes?,
            earnings: earnings_by_date(&plain, self.offset),
            orders,
            specialties: specialties?.into_iter().map(|s| s.specialty).collect(),
            notice: None,
        })
    }

    #[tracing::instrument(skip_all, name = "screen.partner")]
    pub async fn partner(&self, state: &ScreenState<PartnerView>) -> Screen<PartnerView> {
        let (user, chef) = match self.partner_gate().await {
            Ok(gate) => gate,
            Err(screen) => return screen,
        };
        let loaded = self.load_partner(user, chef).await;
        settle(state, loaded, PARTNER_LOAD_FAILED)
    }

    #[tracing::instrument(skip_all)]
    pub async fn add_dish(&self, state: &ScreenState<PartnerView>, draft: MealDraft) -> Screen<PartnerView> {
        let (user, _) = match self.partner_gate().await {
            Ok(gate) => gate,
            Err(screen) => return screen,
        };
        let outcome = self.fetch().create_meal(user, draft).await;
        after_action(state, outcome, "Dish added!", "Failed to add dish", self.partner(state)).await
    }

    #[tracing::instrument(skip(self, state, draft))]
    pub async fn edit_dish(&self, state: &ScreenState<PartnerView>, id: MealId, draft: MealDraft) -> Screen<PartnerView> {
        let (user, _) = match self.partner_gate().await {
            Ok(gate) => gate,
            Err(screen) => return screen,
        };
        let outcome = self.fetch().update_meal(user, id, draft).await;
        after_action(state, outcome, "Dish updated!", "Failed to update dish", self.partner(state)).await
    }

    #[tracing::instrument(skip(self, state))]
    pub async fn toggle_dish(&self, state: &ScreenState<PartnerView>, id: MealId) -> Screen<PartnerView> {
        let (user, _) = match self.partner_gate().await {
            Ok(gate) => gate,
            Err(screen) => return screen,
        };
        let outcome = self.fetch().toggle_meal(user, id).await;
        let success = match &outcome {
            Ok(meal) if meal.available => "Dish is now available",
            _ => "Dish is now unavailable",
        };
        after_action(state, outcome, success, "Failed to update dish", self.partner(state)).await
    }

    #[tracing::instrument(skip(self, state))]
    pub async fn remove_dish(&self, state: &ScreenState<PartnerView>, id: MealId) -> Screen<PartnerView> {
        let (user, _) = match self.partner_gate().await {
            Ok(gate) => gate,
            Err(screen) => return screen,
        };
        let outcome = self.fetch().delete_meal(user, id).await;
        after_action(state, outcome, "Dish deleted", "Failed to delete dish", self.partner(state)).await
    }

    /// Accept, reject, start preparing or send out an incoming order.
    #[tracing::instrument(skip(self, state))]
    pub async fn advance_order(
        &self,
        state: &ScreenState<PartnerView>,
        order: OrderId,
        next: OrderStatus,
    ) -> Screen<PartnerView> {
        let (user, _) = match self.partner_gate().await {
            Ok(gate) => gate,
            Err(screen) => return screen,
        };
        let outcome = self
            .fetch()
            .transition_order(order, next, Actor::Chef, user)
            .await;
        let success = format!("Order {}", next.as_str().replace('_', " "));
        after_action(state, outcome, success, "Failed to update order", self.partner(state)).await
    }

    #[tracing::instrument(skip_all)]
    pub async fn update_kitchen(&self, state: &ScreenState<PartnerView>, update: ChefProfileUpdate) -> Screen<PartnerView> {
        let (_, chef) = match self.partner_gate().await {
            Ok(gate) => gate,
            Err(screen) => return screen,
        };
        let outcome = self.fetch().update_chef_profile(chef.id, update).await;
        after_action(
            state,
            outcome,
            "Profile updated successfully!",
            "Failed to update profile",
            self.partner(state),
        )
        .await
    }

    #[tracing::instrument(skip(self, state))]
    pub async fn add_specialty(&self, state: &ScreenState<PartnerView>, specialty: &str) -> Screen<PartnerView> {
        let (_, chef) = match self.partner_gate().await {
            Ok(gate) => gate,
            Err(screen) => return screen,
        };
        let outcome = self.fetch().add_specialty(chef.id, specialty).await;
        after_action(state, outcome, "Specialty added!", "Failed to add specialty", self.partner(state)).await
    }

    #[tracing::instrument(skip(self, state))]
    pub async fn remove_specialty(&self, state: &ScreenState<PartnerView>, specialty: &str) -> Screen<PartnerView> {
        let (_, chef) = match self.partner_gate().await {
            Ok(gate) => gate,
            Err(screen) => return screen,
        };
        let outcome = self.fetch().remove_specialty(chef.id, specialty).await;
        after_action(
            state,
            outcome,
            "Specialty removed!",
            "Failed to remove specialty",
            self.partner(state),
        )
        .await
    }
}
