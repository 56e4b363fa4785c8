//! The remote data-service contract every fetcher talks through.
//!
//! Reads are `select`/`count` over a [`Query`] of exact `eq`/`in` filters,
//! ordering and a limit. Writes are single-row and keyed by primary id.
//! Rows travel as serde records so any backend that can produce JSON-shaped
//! rows with the same column names can sit behind the trait.

use std::{fmt, future::Future, marker::PhantomData};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub mod memory;
pub mod orm;

pub use memory::MemoryStore;
pub use orm::OrmStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Profiles,
    UserRoles,
    Chefs,
    ChefSpecialties,
    Meals,
    Orders,
    OrderItems,
    Reviews,
    Subscriptions,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::UserRoles => "user_roles",
            Table::Chefs => "chefs",
            Table::ChefSpecialties => "chef_specialties",
            Table::Meals => "meals",
            Table::Orders => "orders",
            Table::OrderItems => "order_items",
            Table::Reviews => "reviews",
            Table::Subscriptions => "subscriptions",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A row type stored in one table with a uuid primary key named `id`.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: Table;

    fn id(&self) -> Uuid;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
    Int(i64),
}

impl FilterValue {
    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Uuid(id) => Value::String(id.to_string()),
            FilterValue::Text(text) => Value::String(text.clone()),
            FilterValue::Bool(flag) => Value::Bool(*flag),
            FilterValue::Int(n) => Value::from(*n),
        }
    }
}

impl From<Uuid> for FilterValue {
    fn from(id: Uuid) -> Self {
        FilterValue::Uuid(id)
    }
}

impl From<&str> for FilterValue {
    fn from(text: &str) -> Self {
        FilterValue::Text(text.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(text: String) -> Self {
        FilterValue::Text(text)
    }
}

impl From<bool> for FilterValue {
    fn from(flag: bool) -> Self {
        FilterValue::Bool(flag)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Int(n)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq {
        column: &'static str,
        value: FilterValue,
    },
    In {
        column: &'static str,
        values: Vec<FilterValue>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub column: &'static str,
    pub ascending: bool,
}

/// `table(T).select().eq(..).in(..).order(..).limit(..)`, typed by record.
pub struct Query<T> {
    filters: Vec<Filter>,
    orderings: Vec<Ordering>,
    limit: Option<u64>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Query<T> {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            orderings: Vec::new(),
            limit: None,
            _record: PhantomData,
        }
    }

    pub fn by_id(id: impl Into<FilterValue>) -> Self {
        Self::new().eq("id", id)
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<FilterValue>) -> Self {
        self.filters.push(Filter::Eq {
            column,
            value: value.into(),
        });
        self
    }

    pub fn is_in<V, I>(mut self, column: &'static str, values: I) -> Self
    where
        V: Into<FilterValue>,
        I: IntoIterator<Item = V>,
    {
        self.filters.push(Filter::In {
            column,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn order(mut self, column: &'static str, ascending: bool) -> Self {
        self.orderings.push(Ordering { column, ascending });
        self
    }

    pub fn newest_first(self) -> Self {
        self.order("created_at", false)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table(&self) -> Table {
        T::TABLE
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn orderings(&self) -> &[Ordering] {
        &self.orderings
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }
}

impl<T: Record> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            orderings: self.orderings.clone(),
            limit: self.limit,
            _record: PhantomData,
        }
    }
}

impl<T: Record> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("table", &T::TABLE)
            .field("filters", &self.filters)
            .field("orderings", &self.orderings)
            .field("limit", &self.limit)
            .finish()
    }
}

/// Column values for a partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes(Map<String, Value>);

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.0.insert(column.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay these changes onto a serialized row.
    pub fn apply_to(&self, row: &mut Value) -> AppResult<()> {
        let object = row
            .as_object_mut()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("row is not a JSON object")))?;
        for (column, value) in &self.0 {
            object.insert(column.clone(), value.clone());
        }
        Ok(())
    }
}

pub trait DataService: Send + Sync {
    fn select<T: Record>(&self, query: Query<T>)
    -> impl Future<Output = AppResult<Vec<T>>> + Send;

    /// Count-only query; no rows travel back.
    fn count<T: Record>(&self, query: Query<T>) -> impl Future<Output = AppResult<u64>> + Send;

    fn insert<T: Record>(&self, record: T) -> impl Future<Output = AppResult<T>> + Send;

    fn update<T: Record>(
        &self,
        id: Uuid,
        changes: Changes,
    ) -> impl Future<Output = AppResult<T>> + Send;

    fn delete<T: Record>(&self, id: Uuid) -> impl Future<Output = AppResult<()>> + Send;

    fn delete_where<T: Record>(&self, query: Query<T>)
    -> impl Future<Output = AppResult<u64>> + Send;

    /// First matching row, if any.
    fn select_one<T: Record>(
        &self,
        query: Query<T>,
    ) -> impl Future<Output = AppResult<Option<T>>> + Send {
        async move { Ok(self.select(query.limit(1)).await?.into_iter().next()) }
    }

    /// One row by primary key; absence is [`AppError::NotFound`].
    fn find<T: Record>(&self, id: Uuid) -> impl Future<Output = AppResult<T>> + Send {
        async move {
            self.select_one(Query::<T>::by_id(id))
                .await?
                .ok_or(AppError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Order;

    #[test]
    fn query_builder_records_filters_in_order() {
        let chef = Uuid::new_v4();
        let query = Query::<Order>::new()
            .eq("chef_id", chef)
            .is_in("status", ["delivered"])
            .newest_first()
            .limit(5);

        assert_eq!(query.table(), Table::Orders);
        assert_eq!(query.filters().len(), 2);
        assert_eq!(
            query.filters()[0],
            Filter::Eq {
                column: "chef_id",
                value: FilterValue::Uuid(chef)
            }
        );
        assert_eq!(query.orderings()[0].column, "created_at");
        assert!(!query.orderings()[0].ascending);
        assert_eq!(query.limit_value(), Some(5));
    }

    #[test]
    fn changes_overlay_existing_columns() {
        let mut row = serde_json::json!({ "id": "x", "status": "pending", "quantity": 2 });
        Changes::new()
            .set("status", "accepted")
            .apply_to(&mut row)
            .unwrap();
        assert_eq!(row["status"], "accepted");
        assert_eq!(row["quantity"], 2);
    }
}
