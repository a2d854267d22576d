use async_trait::async_trait;

use super::condition::Condition;
use super::record::{PrimaryKey, Record};
use super::StoreError;

/// A put guarded by an optional predicate on the item currently stored under
/// the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalPut {
    pub record: Record,
    pub condition: Option<Condition>,
}

impl ConditionalPut {
    pub fn new(record: Record, condition: Condition) -> Self {
        Self {
            record,
            condition: Some(condition),
        }
    }

    pub fn unconditional(record: Record) -> Self {
        Self {
            record,
            condition: None,
        }
    }
}

/// One item of a transactional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put(ConditionalPut),
    Delete {
        key: PrimaryKey,
        condition: Option<Condition>,
    },
}

impl WriteOp {
    pub fn key(&self) -> &PrimaryKey {
        match self {
            WriteOp::Put(put) => &put.record.key,
            WriteOp::Delete { key, .. } => key,
        }
    }

    pub fn condition(&self) -> Option<&Condition> {
        match self {
            WriteOp::Put(put) => put.condition.as_ref(),
            WriteOp::Delete { condition, .. } => condition.as_ref(),
        }
    }
}

/// The key-value table every repository writes through.
///
/// Implementations must evaluate predicates atomically with the write they
/// guard, and apply a transaction entirely or not at all.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Strongly consistent point lookup.
    async fn get_item(&self, key: &PrimaryKey) -> Result<Option<Record>, StoreError>;

    /// Writes the record, replacing any existing item. Fails with
    /// [`StoreError::ConditionFailed`] when the predicate does not hold.
    async fn put_item(&self, put: ConditionalPut) -> Result<(), StoreError>;

    /// Removes the item. Deleting a missing key succeeds.
    async fn delete_item(&self, key: &PrimaryKey) -> Result<(), StoreError>;

    /// Atomically adds `delta` to a numeric attribute, treating a missing item
    /// or attribute as zero, and returns the new value.
    async fn add_to_counter(
        &self,
        key: &PrimaryKey,
        attribute: &str,
        delta: u64,
    ) -> Result<u64, StoreError>;

    /// Applies every operation or none. Fails with
    /// [`StoreError::TransactionCanceled`] naming the positions whose
    /// predicate did not hold.
    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;

    /// Returns every item matching the filter, across all pages.
    async fn scan(&self, filter: &Condition) -> Result<Vec<Record>, StoreError>;
}
