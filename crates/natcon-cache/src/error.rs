//! Storage error types.

use thiserror::Error;

/// Errors that can occur when using client storage.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Storage is disabled or otherwise not reachable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Writing the value would exceed the storage quota.
    #[error("Storage quota exceeded: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { needed: usize, limit: usize },

    /// Failed to serialize or deserialize a value.
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Failed to perform store operation.
    #[error("Store operation failed: {0}")]
    StoreError(String),
}

impl CacheError {
    /// Whether the error means the backend cannot be written at all, as
    /// opposed to a problem with one particular value.
    pub fn is_capability_loss(&self) -> bool {
        matches!(
            self,
            CacheError::Unavailable(_) | CacheError::QuotaExceeded { .. } | CacheError::StoreError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_message() {
        let err = CacheError::QuotaExceeded {
            needed: 120,
            limit: 100,
        };
        assert_eq!(
            err.to_string(),
            "Storage quota exceeded: 120 bytes needed, limit is 100"
        );
        assert!(err.is_capability_loss());
    }

    #[test]
    fn test_serialize_error_is_not_capability_loss() {
        let err: CacheError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(!err.is_capability_loss());
    }
}
