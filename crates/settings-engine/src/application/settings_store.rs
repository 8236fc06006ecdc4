//! SettingsStore: namespaced, JSON-encoded access to a key-value store.
//!
//! Every setting is persisted under `"<namespace>:<storageKey>"` with its value
//! encoded as JSON text, the same layout the web app used in `localStorage`:
//!
//! ```text
//! watchlist:ui.theme          → "\"dark\""
//! watchlist:home.curatedRows  → "5.0"
//! watchlist:ui.overlay        → "true"
//! ```
//!
//! Reads never fail: an absent key or text that does not parse as a setting
//! value yields the caller's fallback.  Writes return a [`PersistError`] so the
//! caller decides what a failed write means for in-memory state.

use std::path::PathBuf;

use settings_core::{Schema, SettingValue, SettingsMap};
use thiserror::Error;
use tracing::{debug, warn};

/// Error type for raw key-value store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store has a size limit and this write would exceed it.
    #[error("storage quota exceeded writing {key}: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    /// A file system I/O error occurred.
    #[error("I/O error accessing store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store's backing file could not be encoded or decoded.
    #[error("store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Error returned by [`SettingsStore::write_setting`].
#[derive(Debug, Error)]
pub enum PersistError {
    /// JSON has no representation for NaN or infinity.
    #[error("refusing to persist non-finite number for {key}")]
    NonFinite { key: String },

    #[error("failed to encode {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to persist {key}: {source}")]
    Store {
        key: String,
        #[source]
        source: StoreError,
    },
}

/// A string-to-string persistence backend.
///
/// The production implementation is a JSON file on disk; tests use the
/// in-memory store or a `mockall` mock.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send {
    /// Returns the raw text stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Outcome of [`SettingsStore::ensure_defaults`].
#[derive(Debug, Default)]
pub struct DefaultsReport {
    /// Keys that were absent and now hold their default.
    pub written: Vec<String>,
    /// Keys that were absent and could not be written.
    pub failed: Vec<(String, PersistError)>,
}

/// Typed settings access over a [`KeyValueStore`].
pub struct SettingsStore<S: KeyValueStore> {
    store: S,
    namespace: String,
}

impl<S: KeyValueStore> SettingsStore<S> {
    pub fn new(store: S, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// The key actually used in the backing store.
    pub fn namespaced_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Returns `true` if a value (parsable or not) is stored for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.store.get(&self.namespaced_key(key)).is_some()
    }

    /// Returns the persisted value for `key`, or `fallback` if it is absent or
    /// does not parse.
    pub fn read_setting(&self, key: &str, fallback: &SettingValue) -> SettingValue {
        let Some(raw) = self.store.get(&self.namespaced_key(key)) else {
            return fallback.clone();
        };
        match serde_json::from_str::<SettingValue>(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("stored value for {key} is unreadable ({e}); using fallback");
                fallback.clone()
            }
        }
    }

    /// Serializes and persists `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Store`] when the backing store rejects the
    /// write (quota, I/O) and [`PersistError::NonFinite`] for NaN or infinite
    /// numbers, which JSON cannot represent.
    pub fn write_setting(&mut self, key: &str, value: &SettingValue) -> Result<(), PersistError> {
        if matches!(value, SettingValue::Number(n) if !n.is_finite()) {
            return Err(PersistError::NonFinite {
                key: key.to_string(),
            });
        }
        let encoded = serde_json::to_string(value).map_err(|source| PersistError::Serialize {
            key: key.to_string(),
            source,
        })?;
        let full_key = self.namespaced_key(key);
        self.store
            .set(&full_key, &encoded)
            .map_err(|source| PersistError::Store {
                key: key.to_string(),
                source,
            })?;
        debug!("persisted {full_key} = {encoded}");
        Ok(())
    }

    /// Writes the default of every descriptor whose key is absent.
    ///
    /// Keys that already hold a value, even an unparsable one, are left
    /// alone, so a second call writes nothing.
    pub fn ensure_defaults(&mut self, schema: &Schema) -> DefaultsReport {
        let mut report = DefaultsReport::default();
        for descriptor in schema.descriptors() {
            if self.contains(&descriptor.storage_key) {
                continue;
            }
            match self.write_setting(&descriptor.storage_key, &descriptor.default) {
                Ok(()) => report.written.push(descriptor.storage_key.clone()),
                Err(e) => {
                    warn!("could not write default for {}: {e}", descriptor.storage_key);
                    report.failed.push((descriptor.storage_key.clone(), e));
                }
            }
        }
        report
    }

    /// Reads every schema key, falling back to its default.
    pub fn load_all(&self, schema: &Schema) -> SettingsMap {
        schema
            .descriptors()
            .map(|d| (d.storage_key.clone(), self.read_setting(&d.storage_key, &d.default)))
            .collect()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
