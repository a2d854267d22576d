//! Single-item conditional writes.
//!
//! Creates are guarded by `attribute_not_exists(PK)`, updates by
//! `Version = <version last read>`. A failed guard is reported as the matching
//! domain conflict and never retried.

use std::sync::Arc;

use chrono::Utc;

use microposts_core::model::RecordState;
use microposts_core::storage::keys::PARTITION_KEY;
use microposts_core::storage::{
    to_record, Condition, ConditionalPut, Entity, PrimaryKey, RepositoryError, Result, StoreError,
    TableStore, WriteOp, VERSION,
};

/// Which guard a prepared write carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update { expected_version: u64 },
}

/// A guarded put together with the entity as it will look once committed.
#[derive(Debug, Clone)]
pub struct PreparedWrite<E> {
    pub entity: E,
    pub put: ConditionalPut,
    pub kind: WriteKind,
}

impl<E: Entity> PreparedWrite<E> {
    /// First write of `entity` under `id`, at version 1.
    pub fn create(entity: &E, id: u64) -> Self {
        let now = Utc::now();
        let mut entity = entity.clone();
        let meta = entity.metadata_mut();
        meta.id = id;
        meta.created_at = now;
        meta.updated_at = now;
        meta.state = RecordState::Persisted { version: 1 };

        let record = to_record(&entity, 1, now);
        Self {
            entity,
            put: ConditionalPut::new(record, Condition::attribute_not_exists(PARTITION_KEY)),
            kind: WriteKind::Create,
        }
    }

    /// Replacement of a persisted `entity`, bumping its version by one.
    pub fn update(entity: &E) -> Result<Self> {
        let RecordState::Persisted { version } = entity.metadata().state else {
            return Err(RepositoryError::InvalidData(format!(
                "{} has not been created yet",
                E::ENTITY_NAME
            )));
        };

        let now = Utc::now();
        let next = version + 1;
        let mut entity = entity.clone();
        let meta = entity.metadata_mut();
        meta.updated_at = now;
        meta.state = RecordState::Persisted { version: next };

        let record = to_record(&entity, next, now);
        Ok(Self {
            entity,
            put: ConditionalPut::new(record, Condition::equals(VERSION, version)),
            kind: WriteKind::Update {
                expected_version: version,
            },
        })
    }

    /// Domain error reported when the guard does not hold.
    pub fn conflict(&self) -> RepositoryError {
        let entity_type = E::ENTITY_NAME;
        let id = self.entity.id();
        match self.kind {
            WriteKind::Create => RepositoryError::AlreadyExists { entity_type, id },
            WriteKind::Update { expected_version } => RepositoryError::StaleVersion {
                entity_type,
                id,
                expected: expected_version,
            },
        }
    }

    pub fn to_op(&self) -> WriteOp {
        WriteOp::Put(self.put.clone())
    }
}

/// Issues single-item conditional writes against the table.
#[derive(Clone)]
pub struct ConditionalWriter {
    store: Arc<dyn TableStore>,
}

impl ConditionalWriter {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Writes `entity` under `id` at version 1, failing with `AlreadyExists`
    /// if a row already occupies the key.
    pub async fn create_if_absent<E: Entity>(&self, entity: &E, id: u64) -> Result<E> {
        self.execute(PreparedWrite::create(entity, id)).await
    }

    /// Writes `entity` at version + 1, failing with `StaleVersion` if the
    /// stored version is no longer the one the entity was read at.
    pub async fn update_if_version_matches<E: Entity>(&self, entity: &E) -> Result<E> {
        self.execute(PreparedWrite::update(entity)?).await
    }

    /// Applies a prepared write and returns the committed entity.
    pub async fn execute<E: Entity>(&self, write: PreparedWrite<E>) -> Result<E> {
        tracing::debug!(record = ?write.put.record, kind = ?write.kind, "Writing entity");

        match self.store.put_item(write.put.clone()).await {
            Ok(()) => Ok(write.entity),
            Err(StoreError::ConditionFailed) => Err(write.conflict()),
            Err(e) => Err(e.into()),
        }
    }

    /// Unconditional, idempotent delete.
    pub async fn delete_by_key(&self, key: &PrimaryKey) -> Result<()> {
        self.store.delete_item(key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use microposts_core::model::User;
    use microposts_core::storage::{from_record, keys::entity_key};

    use super::*;
    use crate::storage::inmemory::InMemoryStore;
    use crate::storage::testing::FailingStore;

    fn setup() -> (Arc<InMemoryStore>, ConditionalWriter) {
        let store = Arc::new(InMemoryStore::new());
        let writer = ConditionalWriter::new(store.clone());
        (store, writer)
    }

    #[test]
    fn test_prepare_create() {
        let write = PreparedWrite::create(&User::new("Alice", "a@x.com"), 1);

        assert_eq!(write.kind, WriteKind::Create);
        assert_eq!(write.entity.id(), 1);
        assert_eq!(write.entity.version(), Some(1));
        assert_eq!(
            write.put.condition,
            Some(Condition::attribute_not_exists("PK"))
        );
        assert_eq!(write.put.record.get_number(VERSION).unwrap(), 1);
    }

    #[test]
    fn test_prepare_update_requires_persisted() {
        let result = PreparedWrite::update(&User::new("Alice", "a@x.com"));
        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_create_then_update() {
        let (store, writer) = setup();

        let created = writer
            .create_if_absent(&User::new("Alice", "a@x.com"), 1)
            .await
            .unwrap();
        assert_eq!(created.version(), Some(1));

        let mut changed = created.clone();
        changed.name = "Alicia".to_string();
        let updated = writer.update_if_version_matches(&changed).await.unwrap();
        assert_eq!(updated.version(), Some(2));
        assert_eq!(updated.meta.created_at, created.meta.created_at);

        let row = store.get_item(&entity_key("User", 1)).await.unwrap().unwrap();
        let stored: User = from_record(&row).unwrap();
        assert_eq!(stored.name, "Alicia");
        assert_eq!(stored.version(), Some(2));
    }

    #[tokio::test]
    async fn test_create_on_occupied_key_fails() {
        let (_store, writer) = setup();

        writer
            .create_if_absent(&User::new("Alice", "a@x.com"), 1)
            .await
            .unwrap();
        let result = writer
            .create_if_absent(&User::new("Bob", "b@x.com"), 1)
            .await;

        assert_eq!(
            result.unwrap_err(),
            RepositoryError::AlreadyExists {
                entity_type: "User",
                id: 1
            }
        );
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let (_store, writer) = setup();

        let v1 = writer
            .create_if_absent(&User::new("Alice", "a@x.com"), 1)
            .await
            .unwrap();
        writer.update_if_version_matches(&v1).await.unwrap();

        let result = writer.update_if_version_matches(&v1).await;
        assert_eq!(
            result.unwrap_err(),
            RepositoryError::StaleVersion {
                entity_type: "User",
                id: 1,
                expected: 1
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_creates_have_one_winner() {
        let (_store, writer) = setup();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let writer = writer.clone();
                tokio::spawn(async move {
                    writer
                        .create_if_absent(&User::new(format!("U{i}"), format!("u{i}@x.com")), 1)
                        .await
                })
            })
            .collect();

        let mut wins = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(RepositoryError::AlreadyExists { .. }) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(conflicts, 7);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, writer) = setup();
        writer
            .create_if_absent(&User::new("Alice", "a@x.com"), 1)
            .await
            .unwrap();

        let key = entity_key("User", 1);
        writer.delete_by_key(&key).await.unwrap();
        writer.delete_by_key(&key).await.unwrap();

        assert!(store.get_item(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_a_conflict() {
        let writer = ConditionalWriter::new(Arc::new(FailingStore));

        let result = writer
            .create_if_absent(&User::new("Alice", "a@x.com"), 1)
            .await;
        assert!(matches!(result, Err(RepositoryError::StoreUnavailable(_))));
    }
}
