//! Setting values and snapshot maps.
//!
//! A setting holds one of three JSON-compatible shapes: a boolean, a number,
//! or a piece of text.  Enum settings (e.g. `ui.theme`) are stored as text and
//! constrained by their descriptor's option list, so they need no variant of
//! their own.
//!
//! Values are persisted as JSON, which is why the enum is `#[serde(untagged)]`:
//! `true`, `3`, and `"dark"` deserialize straight into the matching variant
//! without any wrapper object.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// A full snapshot of settings, keyed by storage key.
///
/// `BTreeMap` keeps iteration order stable, which makes write order during
/// Save and test output deterministic.
pub type SettingsMap = BTreeMap<String, SettingValue>;

impl SettingValue {
    /// Returns the boolean payload, if this is a [`SettingValue::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the numeric payload, if this is a [`SettingValue::Number`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text payload, if this is a [`SettingValue::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Short name of the variant, used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "boolean",
            SettingValue::Number(_) => "number",
            SettingValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{b}"),
            // Whole numbers print without ".0"; large ones are not truncated.
            SettingValue::Number(n) => write!(f, "{n}"),
            SettingValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Bool(b)
    }
}

impl From<f64> for SettingValue {
    fn from(n: f64) -> Self {
        SettingValue::Number(n)
    }
}

impl From<i32> for SettingValue {
    fn from(n: i32) -> Self {
        SettingValue::Number(f64::from(n))
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Text(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::Text(s)
    }
}
