use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Invalid cache key")]
    InvalidKey,
    #[error("Cache miss")]
    CacheMiss,
    /// The stored payload could not be decoded into the requested type.
    #[error("Invalid cache value: {0}")]
    InvalidValue(String),
    #[error("Cache connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_key_display() {
        assert_eq!(CacheError::InvalidKey.to_string(), "Invalid cache key");
    }

    #[test]
    fn test_cache_miss_display() {
        assert_eq!(CacheError::CacheMiss.to_string(), "Cache miss");
    }

    #[test]
    fn test_invalid_value_display() {
        let error = CacheError::InvalidValue("expected struct Account".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid cache value: expected struct Account"
        );
    }

    #[test]
    fn test_connection_failed_display() {
        let error = CacheError::ConnectionFailed("timeout".to_string());
        assert_eq!(error.to_string(), "Cache connection failed: timeout");
    }

    #[test]
    fn test_operation_failed_display() {
        let error = CacheError::OperationFailed("READONLY".to_string());
        assert_eq!(error.to_string(), "Cache operation failed: READONLY");
    }
}
