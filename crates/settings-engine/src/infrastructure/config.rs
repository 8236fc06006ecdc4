//! TOML configuration for the settings engine.
//!
//! Reads and writes [`EngineConfig`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\settings-engine\config.toml`
//! - Linux:    `~/.config/settings-engine/config.toml`
//! - macOS:    `~/Library/Application Support/settings-engine/config.toml`
//!
//! A full file looks like this; every key is optional:
//!
//! ```toml
//! [engine]
//! log_level = "info"
//! dirty_tracking = "sticky"   # or "exact"
//!
//! [storage]
//! namespace = "watchlist"
//! store_path = "/var/lib/watchlist/settings.json"
//!
//! [schema]
//! path = "/etc/watchlist/schema.json"
//!
//! [effects]
//! theme_key = "ui.theme"
//! language_key = "ui.language"
//! overlay_key = "ui.overlay"
//!
//! [[controls]]
//! control_id = "#curated-rows"
//! storage_key = "home.curatedRows"
//!
//! [[groups]]
//! storage_key = "ui.theme"
//! choices = [
//!   { control_id = "#theme-light", value = "light" },
//!   { control_id = "#theme-dark", value = "dark" },
//! ]
//! ```
//!
//! # Defaults (for beginners)
//!
//! Fields annotated with `#[serde(default = "some_fn")]` take the value of
//! `some_fn()` when missing from the file, and whole sections fall back to
//! their `Default` impl.  The engine therefore runs with no config file at all,
//! and an older file missing newer keys still loads.
//!
//! When neither `[[controls]]` nor `[[groups]]` is present the watchlist
//! control map is used.  Giving either one replaces the whole map.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use settings_core::{ControlBinding, ControlMap, EffectKeys, ExclusiveGroup};
use thiserror::Error;
use tracing::{debug, info};

use crate::application::draft_state::{DirtyTracking, SessionOptions};

/// Error type for reading and writing the engine config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `APPDATA`, `XDG_CONFIG_HOME`, nor `HOME` is usable.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config types ──────────────────────────────────────────────────────────────

/// Top-level engine configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub schema: SchemaSection,
    #[serde(default)]
    pub effects: EffectKeys,
    /// Single-control bindings overriding the built-in control map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<Vec<ControlBinding>>,
    /// Exclusive groups overriding the built-in control map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<ExclusiveGroup>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSection {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub dirty_tracking: DirtyTracking,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSection {
    /// Prefix of every persisted key.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// JSON store file.  Defaults to `store.json` in the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SchemaSection {
    /// Schema document.  The embedded watchlist schema is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_namespace() -> String {
    "watchlist".to_string()
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dirty_tracking: DirtyTracking::default(),
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            store_path: None,
        }
    }
}

impl EngineConfig {
    /// The control map to bind: the configured one, or the watchlist panel.
    pub fn control_map(&self) -> ControlMap {
        if self.controls.is_none() && self.groups.is_none() {
            return ControlMap::watchlist_default();
        }
        ControlMap {
            controls: self.controls.clone().unwrap_or_default(),
            groups: self.groups.clone().unwrap_or_default(),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            dirty_tracking: self.engine.dirty_tracking,
            effect_keys: self.effects.clone(),
        }
    }

    /// The store file, falling back to `store.json` in the config directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPlatformConfigDir`] when no path is configured
    /// and the platform directory cannot be determined.
    pub fn store_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("store.json")),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// The engine's directory under the platform config base.
///
/// # Errors
///
/// [`ConfigError::NoPlatformConfigDir`] if the environment gives no base.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// `config.toml` inside [`config_dir`].
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from `path`, or from the default location when `None`.
///
/// A missing file yields `EngineConfig::default()`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: EngineConfig = toml::from_str(&content)?;
            debug!("loaded config from {}", path.display());
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("no config at {}; using defaults", path.display());
            Ok(EngineConfig::default())
        }
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &EngineConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("settings-engine"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("settings-engine"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("settings-engine")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_default_config_uses_watchlist_namespace_and_sticky_tracking() {
        // Arrange / Act
        let cfg = EngineConfig::default();

        // Assert
        assert_eq!(cfg.storage.namespace, "watchlist");
        assert_eq!(cfg.engine.log_level, "info");
        assert_eq!(cfg.engine.dirty_tracking, DirtyTracking::Sticky);
        assert_eq!(cfg.control_map(), ControlMap::watchlist_default());
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg: EngineConfig = toml::from_str("").expect("empty file is valid");
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let cfg: EngineConfig = toml::from_str(
            r#"
            [engine]
            dirty_tracking = "exact"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.engine.dirty_tracking, DirtyTracking::Exact);
        assert_eq!(cfg.engine.log_level, "info");
        assert_eq!(cfg.effects, EffectKeys::default());
    }

    #[test]
    fn test_controls_override_replaces_whole_map() {
        // Arrange
        let text = r##"
            [[controls]]
            control_id = "#rows"
            storage_key = "home.curatedRows"
        "##;

        // Act
        let cfg: EngineConfig = toml::from_str(text).unwrap();
        let map = cfg.control_map();

        // Assert
        assert_eq!(map, ControlMap::new().bind("#rows", "home.curatedRows"));
        assert!(!map.reaches("ui.theme"));
    }

    #[test]
    fn test_groups_override_parses_inline_choices() {
        let text = r##"
            [[groups]]
            storage_key = "ui.theme"
            choices = [
              { control_id = "#light", value = "light" },
              { control_id = "#dark", value = "dark" },
            ]
        "##;

        let cfg: EngineConfig = toml::from_str(text).unwrap();

        assert_eq!(
            cfg.control_map(),
            ControlMap::new().group("ui.theme", &[("#light", "light"), ("#dark", "dark")])
        );
    }

    #[test]
    fn test_invalid_dirty_tracking_is_a_parse_error() {
        let result: Result<EngineConfig, _> = toml::from_str("[engine]\ndirty_tracking = \"loose\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_configured_store_path_wins() {
        let mut cfg = EngineConfig::default();
        cfg.storage.store_path = Some(PathBuf::from("/tmp/settings.json"));
        assert_eq!(cfg.store_path().unwrap(), PathBuf::from("/tmp/settings.json"));
    }

    #[test]
    fn test_save_then_load_round_trips() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("engine_config_test_{}", Uuid::new_v4()));
        let path = dir.join("config.toml");
        let mut cfg = EngineConfig::default();
        cfg.engine.dirty_tracking = DirtyTracking::Exact;
        cfg.storage.namespace = "kiosk".into();
        cfg.groups = Some(ControlMap::watchlist_default().groups);

        // Act
        save_config(&cfg, &path).expect("save");
        let restored = load_config(Some(&path)).expect("load");

        // Assert
        assert_eq!(cfg, restored);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let path = std::env::temp_dir()
            .join(format!("engine_config_test_{}", Uuid::new_v4()))
            .join("config.toml");

        let cfg = load_config(Some(&path)).unwrap();

        assert_eq!(cfg, EngineConfig::default());
    }
}
