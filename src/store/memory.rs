//! In-process tables behind the same contract as the remote store.
//!
//! Rows are kept as the JSON the records serialize to, so filters and
//! ordering see exactly the column values a remote backend would. Tables can
//! be switched into a failing mode to simulate transport errors, and every
//! request is counted per table so join strategies can be compared.

use std::{
    cmp::Ordering as CmpOrdering,
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::DateTime;
use serde_json::Value;
use uuid::Uuid;

use super::{Changes, DataService, Filter, Ordering, Query, Record, Table};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    rows: HashMap<Table, Vec<Value>>,
    failing: HashSet<Table>,
    requests: HashMap<Table, usize>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.inner
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("memory store lock poisoned")))
    }

    /// Put a row in place without going through `insert` (test setup).
    pub fn seed<T: Record>(&self, record: &T) -> AppResult<()> {
        let row = serde_json::to_value(record)?;
        self.tables()?.rows.entry(T::TABLE).or_default().push(row);
        Ok(())
    }

    /// Every subsequent request against `table` fails with a transport error.
    pub fn fail_table(&self, table: Table) -> AppResult<()> {
        self.tables()?.failing.insert(table);
        Ok(())
    }

    pub fn heal_table(&self, table: Table) -> AppResult<()> {
        self.tables()?.failing.remove(&table);
        Ok(())
    }

    /// Number of requests (of any kind) issued against `table` so far.
    pub fn requests(&self, table: Table) -> usize {
        self.tables()
            .map(|tables| tables.requests.get(&table).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn rows<T: Record>(&self) -> AppResult<Vec<T>> {
        let tables = self.tables()?;
        let Some(rows) = tables.rows.get(&T::TABLE) else {
            return Ok(Vec::new());
        };
        rows.iter()
            .map(|row| serde_json::from_value(row.clone()).map_err(AppError::from))
            .collect()
    }

    fn open(&self, table: Table) -> AppResult<MutexGuard<'_, Tables>> {
        let mut tables = self.tables()?;
        *tables.requests.entry(table).or_default() += 1;
        if tables.failing.contains(&table) {
            return Err(AppError::Transport(format!("{table} is unreachable")));
        }
        Ok(tables)
    }
}

fn matches(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| match filter {
        Filter::Eq { column, value } => row.get(*column) == Some(&value.to_json()),
        Filter::In { column, values } => row
            .get(*column)
            .is_some_and(|cell| values.iter().any(|value| *cell == value.to_json())),
    })
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => CmpOrdering::Equal,
        (None | Some(Value::Null), _) => CmpOrdering::Less,
        (_, None | Some(Value::Null)) => CmpOrdering::Greater,
        _ => CmpOrdering::Equal,
    }
}

fn sort_rows(rows: &mut [Value], orderings: &[Ordering]) {
    rows.sort_by(|a, b| {
        orderings
            .iter()
            .map(|ordering| {
                let cmp = compare_cells(a.get(ordering.column), b.get(ordering.column));
                if ordering.ascending { cmp } else { cmp.reverse() }
            })
            .find(|cmp| *cmp != CmpOrdering::Equal)
            .unwrap_or(CmpOrdering::Equal)
    });
}

fn id_matches(row: &Value, id: Uuid) -> bool {
    row.get("id").and_then(Value::as_str) == Some(id.to_string().as_str())
}

impl DataService for MemoryStore {
    async fn select<T: Record>(&self, query: Query<T>) -> AppResult<Vec<T>> {
        let mut rows: Vec<Value> = {
            let tables = self.open(T::TABLE)?;
            tables
                .rows
                .get(&T::TABLE)
                .map(|rows| {
                    rows.iter()
                        .filter(|row| matches(row, query.filters()))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };
        sort_rows(&mut rows, query.orderings());
        if let Some(limit) = query.limit_value() {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(AppError::from))
            .collect()
    }

    async fn count<T: Record>(&self, query: Query<T>) -> AppResult<u64> {
        let tables = self.open(T::TABLE)?;
        let count = tables
            .rows
            .get(&T::TABLE)
            .map(|rows| rows.iter().filter(|row| matches(row, query.filters())).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn insert<T: Record>(&self, record: T) -> AppResult<T> {
        let row = serde_json::to_value(&record)?;
        let mut tables = self.open(T::TABLE)?;
        tables.rows.entry(T::TABLE).or_default().push(row);
        Ok(record)
    }

    async fn update<T: Record>(&self, id: Uuid, changes: Changes) -> AppResult<T> {
        let mut tables = self.open(T::TABLE)?;
        let row = tables
            .rows
            .get_mut(&T::TABLE)
            .and_then(|rows| rows.iter_mut().find(|row| id_matches(row, id)))
            .ok_or(AppError::NotFound)?;
        let mut updated = row.clone();
        changes.apply_to(&mut updated)?;
        let record: T = serde_json::from_value(updated.clone())?;
        *row = updated;
        Ok(record)
    }

    async fn delete<T: Record>(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.open(T::TABLE)?;
        let rows = tables.rows.entry(T::TABLE).or_default();
        let before = rows.len();
        rows.retain(|row| !id_matches(row, id));
        if rows.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn delete_where<T: Record>(&self, query: Query<T>) -> AppResult<u64> {
        let mut tables = self.open(T::TABLE)?;
        let rows = tables.rows.entry(T::TABLE).or_default();
        let before = rows.len();
        rows.retain(|row| !matches(row, query.filters()));
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{
        ids::UserId,
        models::Profile,
    };

    fn profile(name: &str, age_days: i64) -> Profile {
        Profile {
            id: UserId::new(),
            email: format!("{}@example.com", name.to_lowercase()),
            name: name.to_string(),
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    #[tokio::test]
    async fn select_filters_orders_and_limits() {
        let store = MemoryStore::new();
        let old = profile("Asha", 3);
        let new = profile("Bina", 1);
        let other = profile("Chitra", 2);
        for p in [&old, &new, &other] {
            store.seed(p).unwrap();
        }

        let rows = store
            .select(
                Query::<Profile>::new()
                    .is_in("id", [old.id, new.id])
                    .newest_first()
                    .limit(5),
            )
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Bina", "Asha"]);

        let count = store.count(Query::<Profile>::new()).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn failing_table_reports_transport_errors() {
        let store = MemoryStore::new();
        store.seed(&profile("Asha", 0)).unwrap();
        store.fail_table(Table::Profiles).unwrap();

        let err = store.select(Query::<Profile>::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
        assert_eq!(store.requests(Table::Profiles), 1);

        store.heal_table(Table::Profiles).unwrap();
        assert_eq!(store.select(Query::<Profile>::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_by_id() {
        let store = MemoryStore::new();
        let p = profile("Asha", 0);
        store.seed(&p).unwrap();

        let updated: Profile = store
            .update(p.id.as_uuid(), Changes::new().set("name", "Asha K"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Asha K");

        store.delete::<Profile>(p.id.as_uuid()).await.unwrap();
        let err = store.delete::<Profile>(p.id.as_uuid()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
