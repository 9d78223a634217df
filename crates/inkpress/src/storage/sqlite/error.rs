//! SQLite error mapping.
//!
//! Maps `rusqlite::Error` and `tokio_rusqlite::Error` to `RepositoryError`.
//! This is the only place that knows SQLite's error shapes.

use inkpress_core::storage::RepositoryError;

/// Maps a rusqlite error raised while working on `entity_type` identified by `id`.
///
/// # Error Mapping
///
/// - `SQLITE_CONSTRAINT_UNIQUE` / `SQLITE_CONSTRAINT_PRIMARYKEY` → `KeyConflict`
/// - `SQLITE_CONSTRAINT_FOREIGNKEY` → `InvalidData`
/// - `QueryReturnedNoRows` → `NotFound`
/// - open/busy/locked failures → `ConnectionFailed`
/// - All other errors → `QueryFailed`
pub fn map_rusqlite_error(
    err: &rusqlite::Error,
    entity_type: &'static str,
    id: &str,
) -> RepositoryError {
    match err {
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            RepositoryError::key_conflict(entity_type, id)
        }

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            RepositoryError::InvalidData(format!(
                "Foreign key constraint violation for {entity_type} {id}"
            ))
        }

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if matches!(
                sqlite_err.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::DatabaseBusy
                    | rusqlite::ErrorCode::DatabaseLocked
            ) =>
        {
            RepositoryError::ConnectionFailed(err.to_string())
        }

        rusqlite::Error::QueryReturnedNoRows => RepositoryError::not_found(entity_type, id),

        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

/// Returns a `map_err` adapter bound to an entity and id.
pub fn for_entity<'a>(
    entity_type: &'static str,
    id: &'a str,
) -> impl Fn(rusqlite::Error) -> RepositoryError + 'a {
    move |err| map_rusqlite_error(&err, entity_type, id)
}

/// Maps a tokio_rusqlite error to a RepositoryError.
///
/// Statement errors are mapped inside the connection closure, so what reaches
/// this point is mostly connection-level.
pub fn map_tokio_rusqlite_error(
    err: tokio_rusqlite::Error,
    entity_type: &'static str,
) -> RepositoryError {
    match &err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => {
            map_rusqlite_error(rusqlite_err, entity_type, "unknown")
        }
        tokio_rusqlite::Error::ConnectionClosed | tokio_rusqlite::Error::Close(_) => {
            RepositoryError::ConnectionFailed("Connection closed unexpectedly".to_string())
        }
        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}
