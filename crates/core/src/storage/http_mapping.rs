//! Pure mapping from repository errors to HTTP status codes.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `NotFound` -> 404 (Not Found)
/// - `UniquenessConflict` -> 400 (Bad Request, reported as a field error)
/// - `AlreadyExists`, `StaleVersion` -> 409 (Conflict)
/// - `StoreUnavailable` -> 503 (Service Unavailable)
/// - `InvalidData`, `IdSpaceExhausted` -> 500 (Internal Server Error)
///
/// # Examples
///
/// ```
/// use microposts_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::NotFound {
///     entity_type: "User",
///     id: 1,
/// };
/// assert_eq!(repository_error_to_status_code(&error), 404);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::UniquenessConflict { .. } => 400,
        RepositoryError::AlreadyExists { .. } => 409,
        RepositoryError::StaleVersion { .. } => 409,
        RepositoryError::StoreUnavailable(_) => 503,
        RepositoryError::InvalidData(_) => 500,
        RepositoryError::IdSpaceExhausted { .. } => 500,
    }
}
