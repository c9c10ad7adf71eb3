//! In-process storage backends.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{CacheError, KvStore};

/// Map-backed store, optionally limited to a byte quota.
///
/// The quota counts key and value bytes of every entry, mirroring how
/// browser storage accounts for usage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    /// Create an unlimited store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::StoreError("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let mut entries = self.lock()?;

        if let Some(limit) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(CacheError::QuotaExceeded { needed, limit });
            }
        }

        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Storage that refuses every operation.
///
/// Stands in for disabled client storage so the rest of the system can be
/// run, and tested, in memory-only mode.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    /// Create a store that fails with `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for UnavailableStore {
    fn default() -> Self {
        Self::new("storage disabled")
    }
}

#[async_trait]
impl KvStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Unavailable(self.reason.clone()))
    }

    async fn set(&self, _key: &str, _value: &[u8]) -> Result<(), CacheError> {
        Err(CacheError::Unavailable(self.reason.clone()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_set_get_delete() {
        let store = MemoryStore::new();
        store.set("k", b"value").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"value".to_vec()));
        assert!(store.exists("k").await.unwrap());

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_quota_rejects_large_write() {
        let store = MemoryStore::with_quota(10);
        let err = store.set("key", b"0123456789").await.unwrap_err();
        assert!(matches!(err, CacheError::QuotaExceeded { needed: 13, limit: 10 }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_quota_counts_replacement_once() {
        let store = MemoryStore::with_quota(8);
        store.set("k", b"1234567").await.unwrap();
        // Overwriting the same key must not count the old value.
        store.set("k", b"7654321").await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_everything() {
        let store = UnavailableStore::new("private browsing");
        assert!(matches!(
            store.get("k").await,
            Err(CacheError::Unavailable(reason)) if reason == "private browsing"
        ));
        assert!(store.set("k", b"v").await.is_err());
        assert!(store.delete("k").await.is_err());
    }
}
