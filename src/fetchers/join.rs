use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    hash::Hash,
};

use futures::future::join_all;

use super::JoinStrategy;
use crate::store::{DataService, FilterValue, Query, Record};

/// Rows of `T` matching `base` whose `column` matches each key, grouped by that key.
///
/// Lookup failures are logged and leave the affected keys out of the map, so
/// callers fall back per key.
pub(super) async fn lookup_many<S, T, K>(
    store: &S,
    strategy: JoinStrategy,
    base: Query<T>,
    column: &'static str,
    keys: impl IntoIterator<Item = K>,
    key_of: impl Fn(&T) -> K,
) -> HashMap<K, Vec<T>>
where
    S: DataService,
    T: Record,
    K: Into<FilterValue> + Copy + Eq + Hash + Display + Send + Sync,
{
    let mut grouped: HashMap<K, Vec<T>> = HashMap::new();
    match strategy {
        JoinStrategy::Batched => {
            let mut seen = HashSet::new();
            let unique: Vec<K> = keys.into_iter().filter(|key| seen.insert(*key)).collect();
            if unique.is_empty() {
                return grouped;
            }
            match store.select(base.is_in(column, unique)).await {
                Ok(rows) => {
                    for row in rows {
                        grouped.entry(key_of(&row)).or_default().push(row);
                    }
                }
                Err(err) => {
                    tracing::warn!(table = %T::TABLE, column, error = %err, "batched lookup failed");
                }
            }
        }
        JoinStrategy::PerRow => {
            let lookups = keys.into_iter().map(|key| {
                let query = base.clone().eq(column, key);
                async move { (key, store.select(query).await) }
            });
            for (key, result) in join_all(lookups).await {
                match result {
                    Ok(rows) => {
                        grouped.insert(key, rows);
                    }
                    Err(err) => {
                        tracing::warn!(table = %T::TABLE, column, %key, error = %err, "row lookup failed");
                    }
                }
            }
            grouped.retain(|_, rows| !rows.is_empty());
        }
    }
    grouped
}

/// Like [`lookup_many`] for a unique column: at most one row per key.
pub(super) async fn lookup_one<S, T, K>(
    store: &S,
    strategy: JoinStrategy,
    column: &'static str,
    keys: impl IntoIterator<Item = K>,
    key_of: impl Fn(&T) -> K,
) -> HashMap<K, T>
where
    S: DataService,
    T: Record,
    K: Into<FilterValue> + Copy + Eq + Hash + Display + Send + Sync,
{
    lookup_many(store, strategy, Query::new(), column, keys, key_of)
        .await
        .into_iter()
        .filter_map(|(key, rows)| rows.into_iter().next().map(|row| (key, row)))
        .collect()
}
