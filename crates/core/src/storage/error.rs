use thiserror::Error;

/// Errors reported by a [`TableStore`](super::TableStore) backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A single-item write predicate evaluated to false.
    #[error("Conditional check failed")]
    ConditionFailed,
    /// A transaction was aborted. `failed` lists the positions of the items
    /// whose predicate evaluated to false.
    #[error("Transaction canceled, failed items: {failed:?}")]
    TransactionCanceled { failed: Vec<usize> },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: &'static str, id: u64 },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists { entity_type: &'static str, id: u64 },
    #[error("{entity_type} {id} was modified concurrently (expected version {expected})")]
    StaleVersion {
        entity_type: &'static str,
        id: u64,
        expected: u64,
    },
    #[error("{field} is already taken: {value}")]
    UniquenessConflict { field: &'static str, value: String },
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("{entity_type} id space exhausted")]
    IdSpaceExhausted { entity_type: &'static str },
}

impl From<StoreError> for RepositoryError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unavailable(msg) => RepositoryError::StoreUnavailable(msg),
            StoreError::InvalidData(msg) => RepositoryError::InvalidData(msg),
            // Predicate failures only reach here when a caller did not map them
            // to a domain conflict itself.
            other => RepositoryError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
