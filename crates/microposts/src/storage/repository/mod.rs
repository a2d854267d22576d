//! Per-entity repositories.
//!
//! [`EntityRepository`] combines key derivation, id allocation and conditional
//! writes for any [`Entity`]. The user and micropost repositories add their
//! type-specific lookups and, for users, the email uniqueness guard.

mod microposts;
mod users;

use std::marker::PhantomData;
use std::sync::Arc;

use microposts_core::model::RecordState;
use microposts_core::storage::keys::{entity_key, is_valid_id};
use microposts_core::storage::{
    from_record, Condition, Entity, RepositoryError, Result, TableStore,
};

use super::ids::IdGenerator;
use super::writer::{ConditionalWriter, PreparedWrite};

pub use microposts::MicropostRepository;
pub use users::UserRepository;

/// Generic create/read/update/delete over one entity type.
pub struct EntityRepository<E> {
    store: Arc<dyn TableStore>,
    ids: IdGenerator,
    writer: ConditionalWriter,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityRepository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ids: self.ids.clone(),
            writer: self.writer.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> EntityRepository<E> {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            ids: IdGenerator::new(store.clone()),
            writer: ConditionalWriter::new(store.clone()),
            store,
            _entity: PhantomData,
        }
    }

    /// Consistent point lookup. Absence, including ids that can never be
    /// allocated, is `Ok(None)`.
    pub async fn get(&self, id: u64) -> Result<Option<E>> {
        if !is_valid_id(id) {
            return Ok(None);
        }

        let record = self.store.get_item(&entity_key(E::ENTITY_NAME, id)).await?;
        Ok(record.map(|r| from_record::<E>(&r)).transpose()?)
    }

    /// Like [`get`](Self::get), but absence is `NotFound`.
    pub async fn require(&self, id: u64) -> Result<E> {
        self.get(id).await?.ok_or(RepositoryError::NotFound {
            entity_type: E::ENTITY_NAME,
            id,
        })
    }

    /// Every entity of this type, in store order.
    pub async fn list(&self) -> Result<Vec<E>> {
        self.list_where(None).await
    }

    /// Every entity of this type that also satisfies `extra`.
    pub async fn list_where(&self, extra: Option<Condition>) -> Result<Vec<E>> {
        let filter = match extra {
            Some(condition) => E::type_filter().and(condition),
            None => E::type_filter(),
        };

        let records = self.store.scan(&filter).await?;
        let entities = records
            .iter()
            .map(from_record)
            .collect::<std::result::Result<Vec<E>, _>>()?;

        tracing::debug!(entity_type = E::ENTITY_NAME, count = entities.len(), "Scanned entities");
        Ok(entities)
    }

    /// Allocates an id and writes `entity` at version 1.
    pub async fn create(&self, entity: &E) -> Result<E> {
        let id = self.ids.next_id(E::ENTITY_NAME).await?;
        let created = self.writer.create_if_absent(entity, id).await?;

        tracing::info!(entity_type = E::ENTITY_NAME, id, "Created entity");
        Ok(created)
    }

    /// Version-checked replacement of a persisted entity.
    pub async fn update(&self, entity: &E) -> Result<E> {
        let updated = self.writer.update_if_version_matches(entity).await?;

        tracing::info!(
            entity_type = E::ENTITY_NAME,
            id = updated.id(),
            version = ?updated.metadata().version(),
            "Updated entity"
        );
        Ok(updated)
    }

    /// Creates unsaved entities and updates persisted ones at the version
    /// they carry.
    pub async fn save(&self, entity: &E) -> Result<E> {
        match entity.metadata().state {
            RecordState::Unsaved => self.create(entity).await,
            RecordState::Persisted { .. } => self.update(entity).await,
        }
    }

    /// Removes the entity. Deleting a missing entity succeeds.
    pub async fn delete(&self, id: u64) -> Result<()> {
        let Some(entity) = self.get(id).await? else {
            return Ok(());
        };

        self.writer.delete_by_key(&entity.primary_key()).await?;

        tracing::info!(entity_type = E::ENTITY_NAME, id, "Deleted entity");
        Ok(())
    }

    /// Prepares a write routed on the entity state: unsaved entities get a
    /// fresh id and the create guard, persisted ones the version guard.
    pub(crate) async fn prepare(&self, entity: &E) -> Result<PreparedWrite<E>> {
        match entity.metadata().state {
            RecordState::Unsaved => {
                let id = self.ids.next_id(E::ENTITY_NAME).await?;
                Ok(PreparedWrite::create(entity, id))
            }
            RecordState::Persisted { .. } => PreparedWrite::update(entity),
        }
    }
}
