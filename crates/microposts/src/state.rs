//! Shared application state.
//!
//! Handlers receive the repositories through this state. Both repositories
//! write through the same table, chosen at compile time.

use std::sync::Arc;

use microposts_core::storage::TableStore;

use crate::config::Config;
use crate::storage::{MicropostRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub users: UserRepository,
    pub microposts: MicropostRepository,
    pub config: Arc<Config>,
}

impl AppState {
    /// Builds the repositories over `store`.
    pub fn new(store: Arc<dyn TableStore>, config: Config) -> Self {
        Self {
            users: UserRepository::new(store.clone()),
            microposts: MicropostRepository::new(store),
            config: Arc::new(config),
        }
    }

    /// State backed by a fresh in-memory table.
    #[cfg(any(feature = "inmemory", test))]
    pub fn in_memory(config: Config) -> Self {
        use crate::storage::inmemory::InMemoryStore;

        Self::new(Arc::new(InMemoryStore::new()), config)
    }

    /// State backed by the configured DynamoDB table.
    #[cfg(feature = "dynamodb")]
    pub async fn dynamodb(config: Config) -> Self {
        use crate::storage::dynamodb::DynamoDbStore;

        let store = DynamoDbStore::from_config(&config).await;
        tracing::info!(table = store.table_name(), "Using DynamoDB storage");
        Self::new(Arc::new(store), config)
    }
}

#[cfg(any(feature = "inmemory", test))]
impl Default for AppState {
    fn default() -> Self {
        Self::in_memory(Config::default())
    }
}
