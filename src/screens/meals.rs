use serde::Serialize;
use utoipa::ToSchema;

use super::{Screens, settle};
use crate::{
    fetchers::{MealCard, fallback},
    store::DataService,
    view::{Notice, Screen, ScreenState},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct MealsView {
    pub search: String,
    pub meals: Vec<MealCard>,
    pub notice: Option<Notice>,
}

super::impl_view!(MealsView);

/// Case-insensitive substring match on title, description or category.
pub fn matches_search(card: &MealCard, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    [&card.meal.title, &card.meal.description, &card.meal.category]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

impl<S: DataService> Screens<'_, S> {
    #[tracing::instrument(skip(self, state))]
    pub async fn meals(&self, state: &ScreenState<MealsView>, search: Option<&str>) -> Screen<MealsView> {
        let search = search.unwrap_or_default().trim().to_string();
        let loaded = self
            .fetch()
            .available_meals(None, fallback::UNKNOWN_CHEF)
            .await
            .map(|meals| MealsView {
                meals: meals
                    .into_iter()
                    .filter(|card| matches_search(card, &search))
                    .collect(),
                search,
                notice: None,
            });
        settle(state, loaded, "Failed to load meals")
    }
}
