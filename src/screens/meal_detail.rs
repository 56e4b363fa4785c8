use serde::Serialize;
use utoipa::ToSchema;

use super::{Screens, stay_with_failure};
use crate::{
    fetchers::{MealCard, OrderRequest, fallback},
    ids::{ChefId, MealId},
    store::DataService,
    view::{Notice, Redirect, Route, Screen, ScreenState},
};

pub const SIGN_IN_TO_ORDER: &str = "Please sign in to place an order";
pub const ORDER_PLACED: &str = "Order placed! Redirecting to payment...";

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct MealDetailView {
    pub meal: Option<MealCard>,
    /// The chef's profile page, when the meal's chef has one.
    pub chef_profile: Option<ChefId>,
    pub notice: Option<Notice>,
}

super::impl_view!(MealDetailView);

impl<S: DataService> Screens<'_, S> {
    /// A missing or unreadable meal sends the visitor back to the menu.
    #[tracing::instrument(skip(self, state))]
    pub async fn meal_detail(&self, state: &ScreenState<MealDetailView>, id: MealId) -> Screen<MealDetailView> {
        let fetch = self.fetch();
        let card = match fetch.meal_card(id, fallback::UNKNOWN_CHEF).await {
            Ok(card) => card,
            Err(err) => {
                tracing::warn!(error = %err, "meal detail unavailable");
                return Screen::Redirect(Redirect::with_notice(
                    Route::Meals,
                    Notice::failure(&err, "Failed to load meal details"),
                ));
            }
        };
        let chef_profile = match fetch.chef_for_user(card.meal.chef_id).await {
            Ok(chef) => chef.map(|c| c.id),
            Err(err) => {
                tracing::warn!(error = %err, "chef profile lookup failed");
                None
            }
        };

        let view = MealDetailView {
            meal: Some(card),
            chef_profile,
            notice: None,
        };
        state.commit(view.clone());
        Screen::Ready(view)
    }

    /// Place an order for this meal. Anonymous visitors go to login first and
    /// come back here afterwards.
    #[tracing::instrument(skip(self, state, request))]
    pub async fn order_meal(
        &self,
        state: &ScreenState<MealDetailView>,
        id: MealId,
        request: OrderRequest,
    ) -> Screen<MealDetailView> {
        let Some(identity) = self.identity() else {
            return Screen::Redirect(self.login_first(Route::MealDetail(id), SIGN_IN_TO_ORDER));
        };
        match self.fetch().place_order(identity.id, id, request).await {
            Ok(_) => Screen::Redirect(Redirect::with_notice(
                Route::Orders,
                Notice::success(ORDER_PLACED),
            )),
            Err(err) => stay_with_failure(state, &err, "Failed to place order. Please try again."),
        }
    }
}
