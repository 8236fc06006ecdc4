//! In-memory key-value store.
//!
//! Browsers cap `localStorage` at a few megabytes and throw a quota error
//! when a write would exceed it.  [`MemoryStore::with_quota`] reproduces that
//! failure mode so tests can exercise partial saves without a browser.
//!
//! The quota counts the bytes of every key plus every value currently held.

use std::collections::HashMap;

use crate::application::settings_store::{KeyValueStore, StoreError};

/// A `HashMap`-backed [`KeyValueStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that refuses writes once `quota` bytes are held.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(quota),
        }
    }

    /// Total bytes of keys and values currently stored.
    pub fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A copy of every entry, for assertions.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.quota {
            let replaced = self.entries.get(key).map_or(0, |old| key.len() + old.len());
            let needed = self.used_bytes() - replaced + key.len() + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get_returns_value() {
        let mut store = MemoryStore::new();
        store.set("ns:a", "1").unwrap();
        assert_eq!(store.get("ns:a").as_deref(), Some("1"));
    }

    #[test]
    fn test_quota_rejects_write_that_would_overflow() {
        // Arrange: "ns:a" + "1" = 5 bytes
        let mut store = MemoryStore::with_quota(5);
        store.set("ns:a", "1").unwrap();

        // Act
        let result = store.set("ns:b", "2");

        // Assert
        assert!(matches!(
            result,
            Err(StoreError::QuotaExceeded { needed: 10, limit: 5, .. })
        ));
        assert_eq!(store.get("ns:b"), None);
    }

    #[test]
    fn test_quota_accounts_for_replaced_value() {
        let mut store = MemoryStore::with_quota(6);
        store.set("ns:a", "12").unwrap();
        // Replacing with a value of the same size stays within the quota.
        assert!(store.set("ns:a", "34").is_ok());
        assert_eq!(store.used_bytes(), 6);
    }
}
