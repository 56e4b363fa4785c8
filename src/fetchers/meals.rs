use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Fetch, join::lookup_many, optional, required};
use crate::{
    error::{AppError, AppResult},
    ids::{MealId, UserId},
    models::Meal,
    store::{Changes, DataService, Query},
};

pub const DEFAULT_CATEGORY: &str = "main course";

/// A meal with its chef's display name.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MealCard {
    #[serde(flatten)]
    pub meal: Meal,
    pub chef_name: String,
}

/// Chef-entered fields for a new or edited dish.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MealDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    pub image_url: Option<String>,
    #[serde(default)]
    pub spice_levels: Vec<String>,
    #[serde(default)]
    pub oil_options: Vec<String>,
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
}

fn default_available() -> bool {
    true
}

impl MealDraft {
    fn validate(self) -> AppResult<Self> {
        let title = required(&self.title, "Dish name")?;
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(AppError::validation("Price must be greater than zero"));
        }
        if self.min_quantity.is_some_and(|min| min < 1) {
            return Err(AppError::validation("Minimum quantity must be at least 1"));
        }
        if let (Some(min), Some(max)) = (self.min_quantity, self.max_quantity) {
            if max < min {
                return Err(AppError::validation(
                    "Maximum quantity can't be below the minimum",
                ));
            }
        }
        let category = optional(self.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        Ok(Self {
            title,
            description: self.description.trim().to_string(),
            category: Some(category),
            image_url: optional(self.image_url),
            ..self
        })
    }

    fn changes(&self) -> Changes {
        Changes::new()
            .set("title", self.title.as_str())
            .set("description", self.description.as_str())
            .set("price", self.price)
            .set("category", self.category.clone())
            .set("available", self.available)
            .set("image_url", self.image_url.clone())
            .set("spice_levels", self.spice_levels.clone())
            .set("oil_options", self.oil_options.clone())
            .set("min_quantity", self.min_quantity)
            .set("max_quantity", self.max_quantity)
    }
}

impl Meal {
    /// Whether `quantity` is inside the dish's min/max bounds.
    pub fn accepts_quantity(&self, quantity: i32) -> bool {
        quantity >= self.min_quantity.unwrap_or(1).max(1)
            && self.max_quantity.is_none_or(|max| quantity <= max)
    }
}

impl<S: DataService> Fetch<'_, S> {
    pub(crate) async fn with_chef_names(&self, meals: Vec<Meal>, fallback: &str) -> Vec<MealCard> {
        let names = self.names(meals.iter().map(|m| m.chef_id)).await;
        meals
            .into_iter()
            .map(|meal| MealCard {
                chef_name: names
                    .get(&meal.chef_id)
                    .cloned()
                    .unwrap_or_else(|| fallback.to_string()),
                meal,
            })
            .collect()
    }

    pub async fn meal(&self, id: MealId) -> AppResult<Meal> {
        self.store.find(id.as_uuid()).await
    }

    pub async fn meal_card(&self, id: MealId, fallback: &str) -> AppResult<MealCard> {
        let meal = self.meal(id).await?;
        let mut cards = self.with_chef_names(vec![meal], fallback).await;
        cards.pop().ok_or(AppError::NotFound)
    }

    /// Available meals, newest first.
    pub async fn available_meals(&self, limit: Option<u64>, fallback: &str) -> AppResult<Vec<MealCard>> {
        let mut query = Query::<Meal>::new().eq("available", true).newest_first();
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let meals = self.store.select(query).await?;
        Ok(self.with_chef_names(meals, fallback).await)
    }

    /// Every dish a chef owns, newest first.
    pub async fn chef_meals(&self, chef: UserId) -> AppResult<Vec<Meal>> {
        self.store
            .select(Query::<Meal>::new().eq("chef_id", chef).newest_first())
            .await
    }

    pub async fn available_chef_meals(&self, chef: UserId) -> AppResult<Vec<Meal>> {
        self.store
            .select(
                Query::<Meal>::new()
                    .eq("chef_id", chef)
                    .eq("available", true)
                    .newest_first(),
            )
            .await
    }

    /// The first available dish of each chef, keyed by the chef's user id.
    pub async fn signature_dishes(&self, chefs: impl IntoIterator<Item = UserId>) -> HashMap<UserId, Meal> {
        let base = Query::<Meal>::new()
            .eq("available", true)
            .order("created_at", true);
        lookup_many(self.store, self.joins, base, "chef_id", chefs, |m: &Meal| m.chef_id)
            .await
            .into_iter()
            .filter_map(|(chef, meals)| meals.into_iter().next().map(|meal| (chef, meal)))
            .collect()
    }

    pub async fn create_meal(&self, chef: UserId, draft: MealDraft) -> AppResult<Meal> {
        let draft = draft.validate()?;
        let meal = Meal {
            id: MealId::new(),
            chef_id: chef,
            title: draft.title,
            description: draft.description,
            price: draft.price,
            category: draft.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            available: draft.available,
            image_url: draft.image_url,
            spice_levels: draft.spice_levels,
            oil_options: draft.oil_options,
            min_quantity: draft.min_quantity,
            max_quantity: draft.max_quantity,
            created_at: Utc::now(),
        };
        let meal = self.store.insert(meal).await?;
        tracing::info!(meal_id = %meal.id, %chef, "dish added");
        Ok(meal)
    }

    async fn owned_meal(&self, chef: UserId, id: MealId) -> AppResult<Meal> {
        let meal = self.meal(id).await?;
        if meal.chef_id != chef {
            return Err(AppError::Forbidden("You can only change your own dishes".into()));
        }
        Ok(meal)
    }

    pub async fn update_meal(&self, chef: UserId, id: MealId, draft: MealDraft) -> AppResult<Meal> {
        let draft = draft.validate()?;
        self.owned_meal(chef, id).await?;
        self.store.update(id.as_uuid(), draft.changes()).await
    }

    /// Flip availability and return the stored row.
    pub async fn toggle_meal(&self, chef: UserId, id: MealId) -> AppResult<Meal> {
        let meal = self.owned_meal(chef, id).await?;
        self.store
            .update(id.as_uuid(), Changes::new().set("available", !meal.available))
            .await
    }

    pub async fn delete_meal(&self, chef: UserId, id: MealId) -> AppResult<()> {
        self.owned_meal(chef, id).await?;
        self.store.delete::<Meal>(id.as_uuid()).await?;
        tracing::info!(meal_id = %id, %chef, "dish deleted");
        Ok(())
    }
}
