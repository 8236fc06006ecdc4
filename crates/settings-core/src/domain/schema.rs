//! Setting descriptors and the schema document.
//!
//! The schema is a JSON document shipped with the app:
//!
//! ```json
//! {
//!   "settings": [
//!     { "storageKey": "ui.theme", "default": "system", "options": ["system", "light", "dark"] },
//!     { "storageKey": "home.curatedRows", "default": 3, "min": 1, "max": 10 },
//!     { "storageKey": "ui.overlay", "default": true }
//!   ]
//! }
//! ```
//!
//! Each entry becomes a [`SettingDescriptor`].  The setting's kind is implicit:
//! an entry with `options` is an enum, otherwise the kind follows the JSON type
//! of `default`.  An explicit `"type"` field is accepted but must agree with
//! what the default implies.
//!
//! The parsed [`Schema`] is immutable and keeps document order, which is also
//! the order controls are rendered and defaults are written in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::value::{SettingValue, SettingsMap};

/// Errors produced while turning a schema document into a [`Schema`].
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The document is not valid JSON or an entry has the wrong shape.
    #[error("schema document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The document parsed but has no `settings` collection.
    #[error("schema document has no `settings` collection")]
    MissingSettings,

    /// Two descriptors share a storage key.
    #[error("duplicate storage key in schema: {0}")]
    DuplicateKey(String),

    /// A descriptor is internally inconsistent.
    #[error("invalid descriptor `{key}`: {reason}")]
    InvalidDescriptor { key: String, reason: String },
}

/// The kind of value a setting holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    Boolean,
    Number,
    String,
    Enum,
}

impl SettingKind {
    /// The kind implied by a default value when no options are given.
    fn of(value: &SettingValue) -> Self {
        match value {
            SettingValue::Bool(_) => SettingKind::Boolean,
            SettingValue::Number(_) => SettingKind::Number,
            SettingValue::Text(_) => SettingKind::String,
        }
    }
}

/// One configurable preference.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingDescriptor {
    /// Namespaced dotted path, unique within the schema (e.g. `ui.theme`).
    pub storage_key: String,
    /// Value used when nothing is persisted.
    pub default: SettingValue,
    pub kind: SettingKind,
    /// Display text for the settings panel.
    pub label: Option<String>,
    /// Inclusive lower bound (numbers only).
    pub min: Option<f64>,
    /// Inclusive upper bound (numbers only).
    pub max: Option<f64>,
    /// Allowed values (enums only).
    pub options: Vec<String>,
    /// Whether an empty string passes validation (strings only).
    pub allow_empty: bool,
}

impl SettingDescriptor {
    /// Boolean setting.
    pub fn boolean(key: &str, default: bool) -> Self {
        Self::bare(key, SettingValue::Bool(default), SettingKind::Boolean)
    }

    /// Numeric setting with optional inclusive bounds.
    pub fn number(key: &str, default: f64, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min,
            max,
            ..Self::bare(key, SettingValue::Number(default), SettingKind::Number)
        }
    }

    /// Free-text setting that must not be empty.
    pub fn text(key: &str, default: &str) -> Self {
        Self::bare(key, SettingValue::from(default), SettingKind::String)
    }

    /// Enumerated setting stored as text.
    pub fn enumeration(key: &str, default: &str, options: &[&str]) -> Self {
        Self {
            options: options.iter().map(|o| o.to_string()).collect(),
            ..Self::bare(key, SettingValue::from(default), SettingKind::Enum)
        }
    }

    fn bare(key: &str, default: SettingValue, kind: SettingKind) -> Self {
        Self {
            storage_key: key.to_string(),
            default,
            kind,
            label: None,
            min: None,
            max: None,
            options: Vec::new(),
            allow_empty: false,
        }
    }

    /// Checks that the descriptor's fields agree with its kind.
    fn check(&self) -> Result<(), SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidDescriptor {
            key: self.storage_key.clone(),
            reason: reason.to_string(),
        };

        if self.storage_key.trim().is_empty() {
            return Err(invalid("storage key must not be empty"));
        }

        match self.kind {
            SettingKind::Enum => {
                if self.options.is_empty() {
                    return Err(invalid("enum setting needs at least one option"));
                }
                match self.default.as_str() {
                    Some(d) if self.options.iter().any(|o| o == d) => {}
                    _ => return Err(invalid("default is not one of the options")),
                }
            }
            kind => {
                if kind != SettingKind::of(&self.default) {
                    return Err(invalid("default does not match the declared type"));
                }
                if !self.options.is_empty() {
                    return Err(invalid("only enum settings may declare options"));
                }
            }
        }

        if self.kind != SettingKind::Number && (self.min.is_some() || self.max.is_some()) {
            return Err(invalid("only number settings may declare min/max"));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(invalid("min is greater than max"));
            }
        }
        Ok(())
    }
}

// ── Raw document shape ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawDocument {
    settings: Option<Vec<RawDescriptor>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDescriptor {
    storage_key: String,
    default: SettingValue,
    #[serde(rename = "type")]
    kind: Option<SettingKind>,
    label: Option<String>,
    min: Option<f64>,
    max: Option<f64>,
    options: Option<Vec<String>>,
    #[serde(default)]
    allow_empty: bool,
}

impl RawDescriptor {
    fn into_descriptor(self) -> Result<SettingDescriptor, SchemaError> {
        let inferred = if self.options.is_some() {
            SettingKind::Enum
        } else {
            SettingKind::of(&self.default)
        };
        if let Some(declared) = self.kind {
            if declared != inferred {
                return Err(SchemaError::InvalidDescriptor {
                    key: self.storage_key,
                    reason: format!("declared type {declared:?} but default implies {inferred:?}"),
                });
            }
        }

        let descriptor = SettingDescriptor {
            storage_key: self.storage_key,
            default: self.default,
            kind: inferred,
            label: self.label,
            min: self.min,
            max: self.max,
            options: self.options.unwrap_or_default(),
            allow_empty: self.allow_empty,
        };
        descriptor.check()?;
        Ok(descriptor)
    }
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// Ordered, read-only collection of setting descriptors.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    descriptors: Vec<SettingDescriptor>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Builds a schema from already-constructed descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateKey`] if two descriptors share a key and
    /// [`SchemaError::InvalidDescriptor`] if any descriptor is inconsistent.
    pub fn new(descriptors: Vec<SettingDescriptor>) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (i, d) in descriptors.iter().enumerate() {
            d.check()?;
            if index.insert(d.storage_key.clone(), i).is_some() {
                return Err(SchemaError::DuplicateKey(d.storage_key.clone()));
            }
        }
        Ok(Self { descriptors, index })
    }

    /// Parses the JSON schema document.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Malformed`] for invalid JSON or wrongly-typed entries,
    /// [`SchemaError::MissingSettings`] when the `settings` collection is
    /// absent, plus the errors of [`Schema::new`].
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let doc: RawDocument = serde_json::from_str(text)?;
        let raw = doc.settings.ok_or(SchemaError::MissingSettings)?;
        let descriptors = raw
            .into_iter()
            .map(RawDescriptor::into_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = descriptors.len(), "parsed settings schema");
        Self::new(descriptors)
    }

    /// Looks up a descriptor by storage key.
    pub fn get(&self, key: &str) -> Option<&SettingDescriptor> {
        self.index.get(key).map(|&i| &self.descriptors[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Descriptors in document order.
    pub fn descriptors(&self) -> impl Iterator<Item = &SettingDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Storage key → default for every descriptor.
    pub fn defaults(&self) -> SettingsMap {
        self.descriptors
            .iter()
            .map(|d| (d.storage_key.clone(), d.default.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "settings": [
            { "storageKey": "ui.theme", "default": "system", "options": ["system", "light", "dark"] },
            { "storageKey": "home.curatedRows", "default": 3, "min": 1, "max": 10, "label": "Curated rows" },
            { "storageKey": "ui.overlay", "default": true },
            { "storageKey": "profile.displayName", "default": "Viewer", "type": "string" }
        ]
    }"#;

    #[test]
    fn test_from_json_parses_all_descriptors_in_order() {
        // Arrange / Act
        let schema = Schema::from_json(DOC).expect("valid schema");

        // Assert
        let keys: Vec<_> = schema.descriptors().map(|d| d.storage_key.as_str()).collect();
        assert_eq!(
            keys,
            ["ui.theme", "home.curatedRows", "ui.overlay", "profile.displayName"]
        );
    }

    #[test]
    fn test_kind_is_inferred_from_default_and_options() {
        let schema = Schema::from_json(DOC).unwrap();
        assert_eq!(schema.get("ui.theme").unwrap().kind, SettingKind::Enum);
        assert_eq!(schema.get("home.curatedRows").unwrap().kind, SettingKind::Number);
        assert_eq!(schema.get("ui.overlay").unwrap().kind, SettingKind::Boolean);
        assert_eq!(schema.get("profile.displayName").unwrap().kind, SettingKind::String);
    }

    #[test]
    fn test_numeric_bounds_and_label_are_kept() {
        let schema = Schema::from_json(DOC).unwrap();
        let rows = schema.get("home.curatedRows").unwrap();
        assert_eq!(rows.min, Some(1.0));
        assert_eq!(rows.max, Some(10.0));
        assert_eq!(rows.label.as_deref(), Some("Curated rows"));
    }

    #[test]
    fn test_defaults_maps_every_key() {
        let defaults = Schema::from_json(DOC).unwrap().defaults();
        assert_eq!(defaults.len(), 4);
        assert_eq!(defaults["ui.theme"], SettingValue::from("system"));
        assert_eq!(defaults["home.curatedRows"], SettingValue::Number(3.0));
    }

    #[test]
    fn test_missing_settings_collection_is_rejected() {
        let result = Schema::from_json(r#"{ "version": 2 }"#);
        assert!(matches!(result, Err(SchemaError::MissingSettings)));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let result = Schema::from_json("{ settings: [");
        assert!(matches!(result, Err(SchemaError::Malformed(_))));
    }

    #[test]
    fn test_entry_without_storage_key_is_malformed() {
        let result = Schema::from_json(r#"{ "settings": [ { "default": 1 } ] }"#);
        assert!(matches!(result, Err(SchemaError::Malformed(_))));
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let doc = r#"{ "settings": [
            { "storageKey": "a", "default": 1 },
            { "storageKey": "a", "default": 2 }
        ] }"#;
        let result = Schema::from_json(doc);
        assert!(matches!(result, Err(SchemaError::DuplicateKey(k)) if k == "a"));
    }

    #[test]
    fn test_enum_default_outside_options_is_rejected() {
        let doc = r#"{ "settings": [
            { "storageKey": "ui.theme", "default": "sepia", "options": ["light", "dark"] }
        ] }"#;
        let result = Schema::from_json(doc);
        assert!(matches!(result, Err(SchemaError::InvalidDescriptor { .. })));
    }

    #[test]
    fn test_declared_type_must_agree_with_default() {
        let doc = r#"{ "settings": [
            { "storageKey": "x", "default": "3", "type": "number" }
        ] }"#;
        assert!(matches!(
            Schema::from_json(doc),
            Err(SchemaError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_min_greater_than_max_is_rejected() {
        let doc = r#"{ "settings": [
            { "storageKey": "x", "default": 3, "min": 5, "max": 1 }
        ] }"#;
        assert!(matches!(
            Schema::from_json(doc),
            Err(SchemaError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_bounds_on_boolean_are_rejected() {
        let mut d = SettingDescriptor::boolean("x", true);
        d.min = Some(0.0);
        assert!(Schema::new(vec![d]).is_err());
    }

    #[test]
    fn test_empty_settings_collection_is_a_valid_empty_schema() {
        let schema = Schema::from_json(r#"{ "settings": [] }"#).unwrap();
        assert!(schema.is_empty());
        assert!(schema.defaults().is_empty());
    }
}
