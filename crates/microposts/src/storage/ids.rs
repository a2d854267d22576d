//! Surrogate id allocation backed by per-type counter rows.

use std::sync::Arc;

use microposts_core::storage::keys::{counter_key, is_valid_id, COUNTER_ATTRIBUTE};
use microposts_core::storage::{RepositoryError, Result, TableStore};

/// Hands out strictly increasing ids per entity type.
///
/// Each call is a single server-side atomic increment, so concurrent callers
/// (in this process or any other) never receive the same id. Ids are never
/// reused, even after the entity is deleted.
#[derive(Clone)]
pub struct IdGenerator {
    store: Arc<dyn TableStore>,
}

impl IdGenerator {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Allocates the next id for `entity_type`. The first id is 1.
    pub async fn next_id(&self, entity_type: &'static str) -> Result<u64> {
        let id = self
            .store
            .add_to_counter(&counter_key(entity_type), COUNTER_ATTRIBUTE, 1)
            .await?;

        if !is_valid_id(id) {
            return Err(RepositoryError::IdSpaceExhausted { entity_type });
        }

        tracing::debug!(entity_type, id, "Allocated id");
        Ok(id)
    }
}
