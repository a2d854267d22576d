//! In-memory table implementation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use microposts_core::storage::{
    AttributeValue, Condition, ConditionalPut, PrimaryKey, Record, StoreError, TableStore, WriteOp,
};

/// In-memory table for tests and local runs.
///
/// Rows live in a `BTreeMap` behind an `Arc<RwLock<_>>`. Every mutating call
/// holds the write lock for its whole duration, which gives conditional
/// writes, counters and transactions the same atomicity the real table
/// provides. Data is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    rows: Arc<RwLock<BTreeMap<PrimaryKey, Record>>>,
}

impl InMemoryStore {
    /// Creates a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored, counters and shadows included.
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

fn holds(condition: Option<&Condition>, current: Option<&Record>) -> bool {
    condition.is_none_or(|c| c.evaluate(current))
}

#[async_trait]
impl TableStore for InMemoryStore {
    async fn get_item(&self, key: &PrimaryKey) -> Result<Option<Record>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.get(key).cloned())
    }

    async fn put_item(&self, put: ConditionalPut) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        if !holds(put.condition.as_ref(), rows.get(&put.record.key)) {
            return Err(StoreError::ConditionFailed);
        }
        rows.insert(put.record.key.clone(), put.record);
        Ok(())
    }

    async fn delete_item(&self, key: &PrimaryKey) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        rows.remove(key);
        Ok(())
    }

    async fn add_to_counter(
        &self,
        key: &PrimaryKey,
        attribute: &str,
        delta: u64,
    ) -> Result<u64, StoreError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .entry(key.clone())
            .or_insert_with(|| Record::new(key.clone()));

        let current = match row.attributes.get(attribute) {
            None => 0,
            Some(AttributeValue::N(n)) => *n,
            Some(other) => {
                return Err(StoreError::InvalidData(format!(
                    "Counter {attribute} at {key} is not a number: {other:?}"
                )))
            }
        };

        let next = current.checked_add(delta).ok_or_else(|| {
            StoreError::InvalidData(format!("Counter {attribute} at {key} overflowed"))
        })?;
        row.attributes
            .insert(attribute.to_string(), AttributeValue::N(next));
        Ok(next)
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut seen = BTreeSet::new();
        if !ops.iter().all(|op| seen.insert(op.key().clone())) {
            return Err(StoreError::InvalidData(
                "Transaction touches the same item more than once".to_string(),
            ));
        }

        let mut rows = self.rows.write().await;

        let failed: Vec<usize> = ops
            .iter()
            .enumerate()
            .filter(|(_, op)| !holds(op.condition(), rows.get(op.key())))
            .map(|(position, _)| position)
            .collect();

        if !failed.is_empty() {
            return Err(StoreError::TransactionCanceled { failed });
        }

        for op in ops {
            match op {
                WriteOp::Put(put) => {
                    rows.insert(put.record.key.clone(), put.record);
                }
                WriteOp::Delete { key, .. } => {
                    rows.remove(&key);
                }
            }
        }

        Ok(())
    }

    async fn scan(&self, filter: &Condition) -> Result<Vec<Record>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|row| filter.evaluate(Some(row)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(partition: &str, sort: &str) -> Record {
        Record::new(PrimaryKey::new(partition, sort)).with("EntityType", "User")
    }

    fn not_exists() -> Condition {
        Condition::attribute_not_exists("PK")
    }

    // ==================== Put / Get / Delete Tests ====================

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = InMemoryStore::new();
        let key = PrimaryKey::new("User-00000000001", "00000000001");
        assert!(store.get_item(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemoryStore::new();
        let record = row("User-00000000001", "00000000001");

        store
            .put_item(ConditionalPut::unconditional(record.clone()))
            .await
            .unwrap();

        assert_eq!(store.get_item(&record.key).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_conditional_put_failure_leaves_row() {
        let store = InMemoryStore::new();
        let first = row("User-00000000001", "00000000001").with("Name", "A");
        let second = row("User-00000000001", "00000000001").with("Name", "B");

        store
            .put_item(ConditionalPut::new(first.clone(), not_exists()))
            .await
            .unwrap();
        let result = store
            .put_item(ConditionalPut::new(second, not_exists()))
            .await;

        assert_eq!(result, Err(StoreError::ConditionFailed));
        assert_eq!(store.get_item(&first.key).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_delete_missing_succeeds() {
        let store = InMemoryStore::new();
        let key = PrimaryKey::new("User-00000000001", "00000000001");
        store.delete_item(&key).await.unwrap();
        store.delete_item(&key).await.unwrap();
    }

    // ==================== Counter Tests ====================

    #[tokio::test]
    async fn test_counter_starts_at_zero() {
        let store = InMemoryStore::new();
        let key = PrimaryKey::new("AtomicCounter-User", "AtomicCounter");

        assert_eq!(store.add_to_counter(&key, "CurrentNumber", 1).await.unwrap(), 1);
        assert_eq!(store.add_to_counter(&key, "CurrentNumber", 5).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_counter_rejects_non_numeric_attribute() {
        let store = InMemoryStore::new();
        let record = Record::new(PrimaryKey::new("AtomicCounter-User", "AtomicCounter"))
            .with("CurrentNumber", "one");
        store
            .put_item(ConditionalPut::unconditional(record.clone()))
            .await
            .unwrap();

        let result = store.add_to_counter(&record.key, "CurrentNumber", 1).await;
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    // ==================== Transaction Tests ====================

    #[tokio::test]
    async fn test_transaction_applies_all() {
        let store = InMemoryStore::new();
        let stale = row("old@x.com", "User");
        store
            .put_item(ConditionalPut::unconditional(stale.clone()))
            .await
            .unwrap();

        let ops = vec![
            WriteOp::Put(ConditionalPut::new(
                row("User-00000000001", "00000000001"),
                not_exists(),
            )),
            WriteOp::Put(ConditionalPut::new(row("a@x.com", "User"), not_exists())),
            WriteOp::Delete {
                key: stale.key.clone(),
                condition: None,
            },
        ];
        store.transact_write(ops).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert!(store.get_item(&stale.key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transaction_reports_failed_positions_and_applies_nothing() {
        let store = InMemoryStore::new();
        let taken = row("a@x.com", "User");
        store
            .put_item(ConditionalPut::unconditional(taken.clone()))
            .await
            .unwrap();

        let ops = vec![
            WriteOp::Put(ConditionalPut::new(
                row("User-00000000002", "00000000002"),
                not_exists(),
            )),
            WriteOp::Put(ConditionalPut::new(taken.clone(), not_exists())),
        ];
        let result = store.transact_write(ops).await;

        assert_eq!(result, Err(StoreError::TransactionCanceled { failed: vec![1] }));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_transaction_rejects_duplicate_keys() {
        let store = InMemoryStore::new();
        let record = row("a@x.com", "User");

        let ops = vec![
            WriteOp::Put(ConditionalPut::unconditional(record.clone())),
            WriteOp::Delete {
                key: record.key.clone(),
                condition: None,
            },
        ];

        let result = store.transact_write(ops).await;
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    // ==================== Scan Tests ====================

    #[tokio::test]
    async fn test_scan_filters_rows() {
        let store = InMemoryStore::new();
        for record in [
            row("User-00000000001", "00000000001"),
            row("User-00000000002", "00000000002"),
            row("a@x.com", "User"),
            Record::new(PrimaryKey::new("AtomicCounter-User", "AtomicCounter")),
        ] {
            store
                .put_item(ConditionalPut::unconditional(record))
                .await
                .unwrap();
        }

        let filter = Condition::begins_with("PK", "User-");
        let found = store.scan(&filter).await.unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| r.key.partition.starts_with("User-")));
    }
}
