use thiserror::Error;

use crate::cache::CacheError;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Entity absent, or present but outside the caller's scope.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} conflicts with an existing key: {id}")]
    KeyConflict {
        entity_type: &'static str,
        id: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// Begin or commit failed.
    #[error("Transaction failed: {0}")]
    Transaction(String),
    /// The unit of work failed and was rolled back.
    #[error("Transaction aborted: {cause}")]
    TxAborted { cause: Box<RepositoryError> },
    /// The unit of work failed and the rollback failed too.
    #[error("Transaction aborted: {cause} (rollback failed: {rollback})")]
    TxRollbackFailed {
        cause: Box<RepositoryError>,
        rollback: String,
    },
}

impl RepositoryError {
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn key_conflict(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::KeyConflict {
            entity_type,
            id: id.into(),
        }
    }

    /// Unwraps transaction wrappers down to the error raised by the unit of work.
    pub fn root_cause(&self) -> &RepositoryError {
        match self {
            Self::TxAborted { cause } | Self::TxRollbackFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), Self::NotFound { .. })
    }

    pub fn is_key_conflict(&self) -> bool {
        matches!(self.root_cause(), Self::KeyConflict { .. })
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
