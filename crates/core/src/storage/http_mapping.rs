//! Pure functions for mapping repository errors to HTTP status codes.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// Transaction wrappers are looked through, so a unit of work that failed with
/// `NotFound` still maps to 404:
///
/// - `NotFound` -> 404 (Not Found)
/// - `KeyConflict` -> 409 (Conflict)
/// - `InvalidData` -> 400 (Bad Request)
/// - `ConnectionFailed` -> 503 (Service Unavailable)
/// - anything else -> 500 (Internal Server Error)
///
/// # Examples
///
/// ```
/// use inkpress_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::not_found("Article", "hello-world");
/// assert_eq!(repository_error_to_status_code(&error), 404);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error.root_cause() {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::KeyConflict { .. } => 409,
        RepositoryError::InvalidData(_) => 400,
        RepositoryError::ConnectionFailed(_) => 503,
        RepositoryError::QueryFailed(_)
        | RepositoryError::Serialization(_)
        | RepositoryError::Cache(_)
        | RepositoryError::Transaction(_)
        | RepositoryError::TxAborted { .. }
        | RepositoryError::TxRollbackFailed { .. } => 500,
    }
}
