//! In-memory storage backend.
//!
//! Implements [`TableStore`](microposts_core::storage::TableStore) over a
//! `BTreeMap` so the service can run and be tested without DynamoDB.
//!
//! # Example
//!
//! ```rust,ignore
//! use microposts::storage::inmemory::InMemoryStore;
//!
//! let store = Arc::new(InMemoryStore::new());
//! let users = UserRepository::new(store);
//! ```

mod store;

pub use store::InMemoryStore;
