//! Document-level effects derived from saved settings.
//!
//! After a successful Save the host page reflects a few settings globally:
//! the current theme, the current language, and an overlay presentation
//! class.  [`PresentationState::from_saved`] computes those from the saved
//! snapshot; the engine hands the result to whatever sink the host provides.
//!
//! Which storage keys feed the effects is configurable through
//! [`EffectKeys`].

use serde::{Deserialize, Serialize};

use super::value::SettingsMap;

/// Storage keys that drive document-level effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectKeys {
    #[serde(default = "default_theme_key")]
    pub theme_key: String,
    #[serde(default = "default_language_key")]
    pub language_key: String,
    #[serde(default = "default_overlay_key")]
    pub overlay_key: String,
}

fn default_theme_key() -> String {
    "ui.theme".to_string()
}
fn default_language_key() -> String {
    "ui.language".to_string()
}
fn default_overlay_key() -> String {
    "ui.overlay".to_string()
}

impl Default for EffectKeys {
    fn default() -> Self {
        Self {
            theme_key: default_theme_key(),
            language_key: default_language_key(),
            overlay_key: default_overlay_key(),
        }
    }
}

/// The effects to apply to the host document.
///
/// A `None` field means the corresponding key is absent from the saved
/// snapshot (or has the wrong type) and the host should leave that attribute
/// alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationState {
    pub theme: Option<String>,
    pub language: Option<String>,
    pub overlay: Option<bool>,
}

impl PresentationState {
    pub fn from_saved(saved: &SettingsMap, keys: &EffectKeys) -> Self {
        Self {
            theme: saved
                .get(&keys.theme_key)
                .and_then(|v| v.as_str())
                .map(str::to_string),
            language: saved
                .get(&keys.language_key)
                .and_then(|v| v.as_str())
                .map(str::to_string),
            overlay: saved.get(&keys.overlay_key).and_then(|v| v.as_bool()),
        }
    }
}
