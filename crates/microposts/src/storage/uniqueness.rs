//! Transactional uniqueness through shadow rows.
//!
//! A unique value is reserved by a shadow row keyed by the value itself. The
//! shadow is written in the same transaction as its owner, so two owners can
//! never commit the same value even when both pass every read-side check.

use std::sync::Arc;

use microposts_core::storage::{
    Condition, ConditionalPut, Entity, RepositoryError, Result, StoreError, TableStore,
    UniqueShadow, WriteOp, VERSION,
};

use super::writer::PreparedWrite;

const ENTITY_POSITION: usize = 0;
const SHADOW_POSITION: usize = 1;

/// Couples entity writes with the shadow row reserving one of their fields.
#[derive(Clone)]
pub struct UniquenessGuard {
    store: Arc<dyn TableStore>,
    field: &'static str,
}

impl UniquenessGuard {
    pub fn new(store: Arc<dyn TableStore>, field: &'static str) -> Self {
        Self { store, field }
    }

    /// Commits the entity write and the shadow claim together. When the value
    /// changed, `released` names the previous shadow, which is removed in the
    /// same transaction.
    ///
    /// Fails with `UniquenessConflict` when another owner holds the value, and
    /// with the write's own conflict when its guard fails. Nothing is written
    /// in either case.
    pub async fn reserve_and_write<E: Entity>(
        &self,
        write: PreparedWrite<E>,
        shadow: UniqueShadow,
        released: Option<UniqueShadow>,
    ) -> Result<E> {
        let mut ops = vec![
            write.to_op(),
            WriteOp::Put(ConditionalPut::new(
                shadow.to_record(),
                shadow.owned_or_free(),
            )),
        ];

        if let Some(old) = released.filter(|old| old.key() != shadow.key()) {
            ops.push(WriteOp::Delete {
                key: old.key(),
                condition: Some(old.owned_or_free()),
            });
        }

        tracing::debug!(
            entity_type = E::ENTITY_NAME,
            id = write.entity.id(),
            field = self.field,
            value = %shadow.value,
            items = ops.len(),
            "Writing entity with uniqueness shadow"
        );

        match self.store.transact_write(ops).await {
            Ok(()) => Ok(write.entity),
            Err(StoreError::TransactionCanceled { failed }) => {
                Err(self.classify(&write, &shadow, &failed))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes `entity` and its shadow in one transaction.
    ///
    /// The entity must still be at the version it was read at, and the shadow
    /// must not be held by another owner. Otherwise nothing is deleted and the
    /// call fails with `StaleVersion`.
    pub async fn release_and_delete<E: Entity>(
        &self,
        entity: &E,
        shadow: UniqueShadow,
    ) -> Result<()> {
        let Some(version) = entity.metadata().version() else {
            return Err(RepositoryError::InvalidData(format!(
                "{} has not been created yet",
                E::ENTITY_NAME
            )));
        };

        let ops = vec![
            WriteOp::Delete {
                key: entity.primary_key(),
                condition: Some(Condition::equals(VERSION, version)),
            },
            WriteOp::Delete {
                key: shadow.key(),
                condition: Some(shadow.owned_or_free()),
            },
        ];

        match self.store.transact_write(ops).await {
            Ok(()) => Ok(()),
            Err(StoreError::TransactionCanceled { failed }) => {
                let stale = RepositoryError::StaleVersion {
                    entity_type: E::ENTITY_NAME,
                    id: entity.id(),
                    expected: version,
                };
                Err(if failed.contains(&ENTITY_POSITION) {
                    stale
                } else if failed.is_empty() {
                    RepositoryError::StoreUnavailable(
                        "Transaction canceled, please retry".to_string(),
                    )
                } else {
                    RepositoryError::InvalidData(format!(
                        "{} {} shadow is owned by another {}",
                        self.field,
                        shadow.value,
                        E::ENTITY_NAME
                    ))
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn classify<E: Entity>(
        &self,
        write: &PreparedWrite<E>,
        shadow: &UniqueShadow,
        failed: &[usize],
    ) -> RepositoryError {
        if failed.contains(&SHADOW_POSITION) {
            RepositoryError::UniquenessConflict {
                field: self.field,
                value: shadow.value.clone(),
            }
        } else if failed.contains(&ENTITY_POSITION) {
            write.conflict()
        } else if failed.is_empty() {
            RepositoryError::StoreUnavailable("Transaction canceled, please retry".to_string())
        } else {
            RepositoryError::InvalidData(format!(
                "Previous {} shadow is owned by another {}",
                self.field,
                E::ENTITY_NAME
            ))
        }
    }
}
