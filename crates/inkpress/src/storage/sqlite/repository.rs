//! SQLite repository: connection ownership and transaction scoping.
//!
//! Statement-level work lives in the `account` and `article` modules as sync
//! functions over `&rusqlite::Connection`, so the same code runs standalone or
//! inside a unit of work.

use tokio_rusqlite::Connection;

use inkpress_core::storage::{RepositoryError, Result};

use super::error::map_tokio_rusqlite_error;
use super::schema;

/// Default number of article ids per tag-loading query.
pub const DEFAULT_TAG_BATCH_SIZE: usize = 100;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// SQLite-based repository implementation.
///
/// Implements both `AccountRepository` and `ArticleRepository` over one
/// connection.
pub struct SqliteRepository {
    conn: Connection,
    pub(super) tag_batch_size: usize,
}

impl SqliteRepository {
    /// Creates a new repository with a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Schema tables are created automatically.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self {
            conn,
            tag_batch_size: DEFAULT_TAG_BATCH_SIZE,
        })
    }

    /// Creates a new repository with an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self {
            conn,
            tag_batch_size: DEFAULT_TAG_BATCH_SIZE,
        })
    }

    /// Sets how many article ids are resolved per tag query when listing.
    pub fn with_tag_batch_size(mut self, tag_batch_size: usize) -> Self {
        self.tag_batch_size = tag_batch_size.max(1);
        self
    }

    /// Initialize the database schema.
    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }

    /// Runs `f` on the connection thread.
    pub(super) async fn call<T, F>(&self, entity_type: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.conn
            .call(move |conn| Ok(f(conn)))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, entity_type))?
    }

    /// Runs `f` inside one transaction on the connection thread.
    ///
    /// Commits when `f` succeeds. Otherwise rolls back and returns the error
    /// raised by `f`, or `TxRollbackFailed` carrying both errors when the
    /// rollback fails too. The transaction never outlives this call.
    pub(super) async fn in_transaction<T, F>(&self, entity_type: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.call(entity_type, move |conn| {
            let tx = conn
                .transaction()
                .map_err(|e| RepositoryError::Transaction(format!("begin: {e}")))?;

            match f(&tx) {
                Ok(value) => {
                    tx.commit()
                        .map_err(|e| RepositoryError::Transaction(format!("commit: {e}")))?;
                    Ok(value)
                }
                Err(cause) => match tx.rollback() {
                    Ok(()) => Err(cause),
                    Err(rollback) => Err(RepositoryError::TxRollbackFailed {
                        cause: Box::new(cause),
                        rollback: rollback.to_string(),
                    }),
                },
            }
        })
        .await
    }
}
