//! Storage layer.
//!
//! Repositories are written once against the
//! [`TableStore`](microposts_core::storage::TableStore) contract. The concrete
//! table is selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-process table, no persistence
//! - `dynamodb`: AWS DynamoDB table using `aws-sdk-dynamodb`
//!
//! These features are mutually exclusive.
//!
//! # Examples
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p microposts --no-default-features --features dynamodb
//! ```

// Compile-time checks for mutual exclusivity
#[cfg(all(feature = "inmemory", feature = "dynamodb"))]
compile_error!(
    "Features 'inmemory' and 'dynamodb' are mutually exclusive. \
    Enable only one storage backend at a time."
);

#[cfg(not(any(feature = "inmemory", feature = "dynamodb")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'dynamodb' feature. \
    Example: cargo build -p microposts --features dynamodb"
);

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(any(feature = "inmemory", test))]
pub mod inmemory;

mod ids;
mod repository;
#[cfg(test)]
pub mod testing;
mod uniqueness;
mod writer;

pub use repository::{MicropostRepository, UserRepository};
