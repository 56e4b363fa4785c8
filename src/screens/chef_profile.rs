use serde::Serialize;
use utoipa::ToSchema;

use super::{Screens, settle, stay_with_failure};
use crate::{
    error::AppResult,
    fetchers::{ReviewLine, SubscriptionDraft, fallback, reviews::CHEF_PAGE_REVIEWS},
    ids::ChefId,
    models::{Chef, Meal, PlanType},
    store::DataService,
    view::{Notice, Redirect, Route, Screen, ScreenState},
};

pub const SIGN_IN_TO_SUBSCRIBE: &str = "Please sign in to subscribe";

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ChefProfileView {
    pub chef: Option<Chef>,
    pub name: String,
    pub specialties: Vec<String>,
    pub meals: Vec<Meal>,
    pub reviews: Vec<ReviewLine>,
    pub notice: Option<Notice>,
}

super::impl_view!(ChefProfileView);

impl<S: DataService> Screens<'_, S> {
    async fn load_chef_profile(&self, id: ChefId) -> AppResult<ChefProfileView> {
        let fetch = self.fetch();
        let chef = fetch.chef(id).await?;
        let (mut names, meals, reviews, specialties) = tokio::join!(
            fetch.names([chef.user_id]),
            fetch.available_chef_meals(chef.user_id),
            fetch.chef_reviews(id, CHEF_PAGE_REVIEWS),
            fetch.specialties(id),
        );
        let specialties = specialties
            .inspect_err(|err| tracing::warn!(error = %err, "specialties unavailable"))
            .unwrap_or_default();

        Ok(ChefProfileView {
            name: names
                .remove(&chef.user_id)
                .unwrap_or_else(|| fallback::CHEF.to_string()),
            chef: Some(chef),
            specialties: specialties.into_iter().map(|s| s.specialty).collect(),
            meals: meals?,
            reviews: reviews?,
            notice: None,
        })
    }

    #[tracing::instrument(skip(self, state))]
    pub async fn chef_profile(&self, state: &ScreenState<ChefProfileView>, id: ChefId) -> Screen<ChefProfileView> {
        let loaded = self.load_chef_profile(id).await;
        settle(state, loaded, "Failed to load chef profile")
    }

    /// Start a meal plan with this chef.
    #[tracing::instrument(skip(self, state))]
    pub async fn subscribe_to_chef(
        &self,
        state: &ScreenState<ChefProfileView>,
        id: ChefId,
        plan_type: PlanType,
    ) -> Screen<ChefProfileView> {
        let Some(identity) = self.identity() else {
            return Screen::Redirect(self.login_first(Route::ChefProfile(id), SIGN_IN_TO_SUBSCRIBE));
        };
        match self
            .fetch()
            .create_subscription(identity.id, SubscriptionDraft { chef_id: id, plan_type })
            .await
        {
            Ok(_) => Screen::Redirect(Redirect::with_notice(
                Route::Subscriptions,
                Notice::success("Subscription started"),
            )),
            Err(err) => stay_with_failure(state, &err, "Failed to start subscription"),
        }
    }
}
