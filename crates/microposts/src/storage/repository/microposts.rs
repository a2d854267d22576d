use std::sync::Arc;

use microposts_core::model::Micropost;
use microposts_core::storage::{Condition, Result, TableStore, MICROPOST_USER_ID};

use super::EntityRepository;

/// Microposts and their per-owner listing.
#[derive(Clone)]
pub struct MicropostRepository {
    entities: EntityRepository<Micropost>,
}

impl MicropostRepository {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            entities: EntityRepository::new(store),
        }
    }

    pub async fn get(&self, id: u64) -> Result<Option<Micropost>> {
        self.entities.get(id).await
    }

    /// Every micropost owned by `user_id`, in store order.
    pub async fn list_by_user(&self, user_id: u64) -> Result<Vec<Micropost>> {
        self.entities
            .list_where(Some(Condition::equals(MICROPOST_USER_ID, user_id)))
            .await
    }

    /// Creates a micropost. The owner is not checked for existence.
    pub async fn create(&self, micropost: &Micropost) -> Result<Micropost> {
        self.entities.create(micropost).await
    }

    /// Creates an unsaved micropost or updates a persisted one at the version
    /// it carries.
    pub async fn save(&self, micropost: &Micropost) -> Result<Micropost> {
        self.entities.save(micropost).await
    }

    pub async fn delete(&self, id: u64) -> Result<()> {
        self.entities.delete(id).await
    }
}
