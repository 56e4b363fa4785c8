//! Per-entity reads and writes, with display names joined in client-side.
//!
//! A failed or empty lookup never drops the row it was for. The row keeps a
//! fixed fallback name from [`fallback`] instead.

use std::{fmt, str::FromStr};

use crate::store::DataService;

pub mod chefs;
mod join;
pub mod meals;
pub mod orders;
pub mod profiles;
pub mod reviews;
pub mod subscriptions;

pub use chefs::{ChefCard, ChefProfileUpdate, ChefRow, FeaturedChef};
pub use meals::{MealCard, MealDraft};
pub use orders::{OrderLine, OrderRequest};
pub use reviews::{ReviewDraft, ReviewLine};
pub use subscriptions::{SubscriptionDraft, SubscriptionLine};

/// Names shown when the profile, chef or meal behind a row can't be read.
pub mod fallback {
    pub const UNKNOWN_CHEF: &str = "Unknown Chef";
    pub const HOME_CHEF: &str = "Home Chef";
    pub const CHEF: &str = "Chef";
    pub const CUSTOMER: &str = "Customer";
    pub const UNKNOWN: &str = "Unknown";
    pub const UNKNOWN_MEAL: &str = "Unknown Meal";
}

/// How related rows are looked up for a page of parent rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinStrategy {
    /// One `in (...)` query per related table.
    #[default]
    Batched,
    /// One query per parent row, issued concurrently.
    PerRow,
}

impl FromStr for JoinStrategy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "batched" => Ok(JoinStrategy::Batched),
            "per_row" | "per-row" => Ok(JoinStrategy::PerRow),
            other => Err(anyhow::anyhow!("unknown join strategy `{other}`")),
        }
    }
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinStrategy::Batched => f.write_str("batched"),
            JoinStrategy::PerRow => f.write_str("per_row"),
        }
    }
}

/// Entry point for every fetcher. Cheap to copy.
pub struct Fetch<'a, S> {
    store: &'a S,
    joins: JoinStrategy,
}

impl<S> Clone for Fetch<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Fetch<'_, S> {}

impl<'a, S: DataService> Fetch<'a, S> {
    pub fn new(store: &'a S, joins: JoinStrategy) -> Self {
        Self { store, joins }
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    pub fn joins(&self) -> JoinStrategy {
        self.joins
    }
}

/// Reject blank required text, returning it trimmed.
pub(crate) fn required(value: &str, field: &str) -> crate::error::AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(crate::error::AppError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Blank optional text is stored as absent.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_strategy_parses_config_values() {
        assert_eq!("batched".parse::<JoinStrategy>().unwrap(), JoinStrategy::Batched);
        assert_eq!("PER_ROW".parse::<JoinStrategy>().unwrap(), JoinStrategy::PerRow);
        assert!("eager".parse::<JoinStrategy>().is_err());
    }

    #[test]
    fn blank_text_is_rejected_or_dropped() {
        assert!(required("   ", "Title").is_err());
        assert_eq!(required(" Dal ", "Title").unwrap(), "Dal");
        assert_eq!(optional(Some("  ".into())), None);
    }
}
