//! [`DataService`] over Postgres through sea-orm entities.
//!
//! Each [`Table`] maps onto one entity in [`crate::entity`]. Entity models
//! and domain records share column names, so rows cross between the two by
//! serializing one and deserializing the other.

use std::str::FromStr;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, IntoActiveModel, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Value as OrmValue,
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use super::{Changes, DataService, Filter, FilterValue, Query, Record, Table};
use crate::{
    entity,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct OrmStore {
    conn: DatabaseConnection,
}

impl OrmStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }
}

fn orm_value(value: &FilterValue) -> OrmValue {
    match value {
        FilterValue::Uuid(id) => (*id).into(),
        FilterValue::Text(text) => text.clone().into(),
        FilterValue::Bool(flag) => (*flag).into(),
        FilterValue::Int(n) => (*n).into(),
    }
}

fn column<E>(name: &str) -> AppResult<E::Column>
where
    E: EntityTrait,
    E::Column: FromStr,
{
    E::Column::from_str(name).map_err(|_| {
        AppError::Internal(anyhow::anyhow!(
            "unknown column `{name}` on {}",
            E::default().table_name()
        ))
    })
}

fn condition<E, T>(query: &Query<T>) -> AppResult<Condition>
where
    E: EntityTrait,
    E::Column: FromStr,
    T: Record,
{
    let mut condition = Condition::all();
    for filter in query.filters() {
        condition = match filter {
            Filter::Eq { column: name, value } => {
                condition.add(column::<E>(name)?.eq(orm_value(value)))
            }
            Filter::In { column: name, values } => {
                condition.add(column::<E>(name)?.is_in(values.iter().map(orm_value)))
            }
        };
    }
    Ok(condition)
}

fn to_record<M: Serialize, T: Record>(model: M) -> AppResult<T> {
    Ok(serde_json::from_value(serde_json::to_value(model)?)?)
}

fn to_model<T: Record, M: DeserializeOwned>(record: &T) -> AppResult<M> {
    Ok(serde_json::from_value(serde_json::to_value(record)?)?)
}

async fn select_rows<E, A, T>(conn: &DatabaseConnection, query: &Query<T>) -> AppResult<Vec<T>>
where
    E: EntityTrait,
    E::Column: FromStr,
    E::Model: Serialize + DeserializeOwned + IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    T: Record,
{
    let mut select = E::find().filter(condition::<E, T>(query)?);
    for ordering in query.orderings() {
        let direction = if ordering.ascending { Order::Asc } else { Order::Desc };
        select = select.order_by(column::<E>(ordering.column)?, direction);
    }
    if let Some(limit) = query.limit_value() {
        select = select.limit(limit);
    }
    let models = select.all(conn).await?;
    models.into_iter().map(to_record).collect()
}

async fn count_rows<E, A, T>(conn: &DatabaseConnection, query: &Query<T>) -> AppResult<u64>
where
    E: EntityTrait,
    E::Column: FromStr,
    E::Model: Serialize + DeserializeOwned + IntoActiveModel<A> + Sync,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    T: Record,
{
    let count = E::find()
        .filter(condition::<E, T>(query)?)
        .count(conn)
        .await?;
    Ok(count)
}

async fn insert_row<E, A, T>(conn: &DatabaseConnection, record: &T) -> AppResult<T>
where
    E: EntityTrait,
    E::Column: FromStr,
    E::Model: Serialize + DeserializeOwned + IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    T: Record,
{
    let model: E::Model = to_model(record)?;
    let saved = model.into_active_model().reset_all().insert(conn).await?;
    to_record(saved)
}

async fn update_row<E, A, T>(conn: &DatabaseConnection, id: Uuid, changes: &Changes) -> AppResult<T>
where
    E: EntityTrait,
    E::Column: FromStr,
    E::Model: Serialize + DeserializeOwned + IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    T: Record,
{
    let existing = E::find()
        .filter(column::<E>("id")?.eq(id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut row = serde_json::to_value(&existing)?;
    changes.apply_to(&mut row)?;
    let model: E::Model = serde_json::from_value(row)?;
    let saved = model.into_active_model().reset_all().update(conn).await?;
    to_record(saved)
}

async fn delete_row<E, A, T>(conn: &DatabaseConnection, id: Uuid) -> AppResult<()>
where
    E: EntityTrait,
    E::Column: FromStr,
    E::Model: Serialize + DeserializeOwned + IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    T: Record,
{
    let result = E::delete_many()
        .filter(column::<E>("id")?.eq(id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

async fn delete_matching<E, A, T>(conn: &DatabaseConnection, query: &Query<T>) -> AppResult<u64>
where
    E: EntityTrait,
    E::Column: FromStr,
    E::Model: Serialize + DeserializeOwned + IntoActiveModel<A>,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    T: Record,
{
    let result = E::delete_many()
        .filter(condition::<E, T>(query)?)
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Run one of the generic helpers above against the entity backing `$record`'s table.
macro_rules! on_table {
    ($record:ty, $op:ident ($($arg:expr),*)) => {
        match <$record as Record>::TABLE {
            Table::Profiles => {
                $op::<entity::profiles::Entity, entity::profiles::ActiveModel, $record>($($arg),*).await
            }
            Table::UserRoles => {
                $op::<entity::user_roles::Entity, entity::user_roles::ActiveModel, $record>($($arg),*).await
            }
            Table::Chefs => {
                $op::<entity::chefs::Entity, entity::chefs::ActiveModel, $record>($($arg),*).await
            }
            Table::ChefSpecialties => {
                $op::<entity::chef_specialties::Entity, entity::chef_specialties::ActiveModel, $record>(
                    $($arg),*
                )
                .await
            }
            Table::Meals => {
                $op::<entity::meals::Entity, entity::meals::ActiveModel, $record>($($arg),*).await
            }
            Table::Orders => {
                $op::<entity::orders::Entity, entity::orders::ActiveModel, $record>($($arg),*).await
            }
            Table::OrderItems => {
                $op::<entity::order_items::Entity, entity::order_items::ActiveModel, $record>($($arg),*)
                    .await
            }
            Table::Reviews => {
                $op::<entity::reviews::Entity, entity::reviews::ActiveModel, $record>($($arg),*).await
            }
            Table::Subscriptions => {
                $op::<entity::subscriptions::Entity, entity::subscriptions::ActiveModel, $record>(
                    $($arg),*
                )
                .await
            }
        }
    };
}

impl DataService for OrmStore {
    async fn select<T: Record>(&self, query: Query<T>) -> AppResult<Vec<T>> {
        tracing::debug!(table = %T::TABLE, filters = query.filters().len(), "select");
        on_table!(T, select_rows(&self.conn, &query))
    }

    async fn count<T: Record>(&self, query: Query<T>) -> AppResult<u64> {
        tracing::debug!(table = %T::TABLE, "count");
        on_table!(T, count_rows(&self.conn, &query))
    }

    async fn insert<T: Record>(&self, record: T) -> AppResult<T> {
        tracing::debug!(table = %T::TABLE, id = %record.id(), "insert");
        on_table!(T, insert_row(&self.conn, &record))
    }

    async fn update<T: Record>(&self, id: Uuid, changes: Changes) -> AppResult<T> {
        tracing::debug!(table = %T::TABLE, %id, "update");
        on_table!(T, update_row(&self.conn, id, &changes))
    }

    async fn delete<T: Record>(&self, id: Uuid) -> AppResult<()> {
        tracing::debug!(table = %T::TABLE, %id, "delete");
        on_table!(T, delete_row(&self.conn, id))
    }

    async fn delete_where<T: Record>(&self, query: Query<T>) -> AppResult<u64> {
        tracing::debug!(table = %T::TABLE, "delete where");
        on_table!(T, delete_matching(&self.conn, &query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entity::orders, models::Order};

    #[test]
    fn filter_columns_resolve_against_the_entity() {
        let query = Query::<Order>::new()
            .eq("chef_id", Uuid::new_v4())
            .is_in("status", ["pending", "accepted"]);
        assert!(condition::<orders::Entity, Order>(&query).is_ok());

        let bad = Query::<Order>::new().eq("no_such_column", true);
        let err = condition::<orders::Entity, Order>(&bad).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn filter_values_convert_to_bind_values() {
        let id = Uuid::new_v4();
        assert_eq!(orm_value(&FilterValue::Uuid(id)), OrmValue::from(id));
        assert_eq!(orm_value(&FilterValue::from("delivered")), OrmValue::from("delivered".to_string()));
        assert_eq!(orm_value(&FilterValue::Bool(true)), OrmValue::from(true));
    }
}
