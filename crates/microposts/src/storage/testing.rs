//! Test doubles for the table contract.

use async_trait::async_trait;

use microposts_core::storage::{
    Condition, ConditionalPut, PrimaryKey, Record, StoreError, TableStore, WriteOp,
};

/// A table that rejects every call as unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

fn unavailable() -> StoreError {
    StoreError::Unavailable("Throughput exceeded, please retry".to_string())
}

#[async_trait]
impl TableStore for FailingStore {
    async fn get_item(&self, _key: &PrimaryKey) -> Result<Option<Record>, StoreError> {
        Err(unavailable())
    }

    async fn put_item(&self, _put: ConditionalPut) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn delete_item(&self, _key: &PrimaryKey) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn add_to_counter(
        &self,
        _key: &PrimaryKey,
        _attribute: &str,
        _delta: u64,
    ) -> Result<u64, StoreError> {
        Err(unavailable())
    }

    async fn transact_write(&self, _ops: Vec<WriteOp>) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn scan(&self, _filter: &Condition) -> Result<Vec<Record>, StoreError> {
        Err(unavailable())
    }
}
