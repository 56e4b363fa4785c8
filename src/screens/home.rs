use serde::Serialize;
use utoipa::ToSchema;

use super::{Screens, settle};
use crate::{
    fetchers::{FeaturedChef, MealCard, fallback},
    roles::{NavRole, resolve_role},
    store::DataService,
    view::{Notice, Screen, ScreenState},
};

pub const POPULAR_MEALS: u64 = 8;
pub const FEATURED_CHEFS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HomeView {
    pub role: NavRole,
    pub featured_chefs: Vec<FeaturedChef>,
    pub popular_meals: Vec<MealCard>,
    pub notice: Option<Notice>,
}

impl Default for HomeView {
    fn default() -> Self {
        Self {
            role: NavRole::Anonymous,
            featured_chefs: Vec::new(),
            popular_meals: Vec::new(),
            notice: None,
        }
    }
}

super::impl_view!(HomeView);

impl<S: DataService> Screens<'_, S> {
    #[tracing::instrument(skip_all, name = "screen.home")]
    pub async fn home(&self, state: &ScreenState<HomeView>) -> Screen<HomeView> {
        let fetch = self.fetch();
        let role = resolve_role(self.identity().as_ref());
        let loaded = tokio::try_join!(
            fetch.featured_chefs(FEATURED_CHEFS),
            fetch.available_meals(Some(POPULAR_MEALS), fallback::UNKNOWN_CHEF),
        )
        .map(|(featured_chefs, popular_meals)| HomeView {
            role,
            featured_chefs,
            popular_meals,
            notice: None,
        });
        settle(state, loaded, "Failed to load the home page")
    }
}
