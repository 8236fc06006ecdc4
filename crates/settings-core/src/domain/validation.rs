//! Draft validation.
//!
//! [`validate_draft`] is the gate in front of the Save action.  It checks every
//! schema entry that a control can reach and returns a map of the keys that
//! fail, each with a human-readable [`FieldError`].  An empty map means the
//! draft may be saved.
//!
//! # Rules per kind
//!
//! | Kind      | Rule                                                   |
//! |-----------|--------------------------------------------------------|
//! | `number`  | finite, `min <= value <= max` when bounds are declared |
//! | `string`  | not blank, unless the descriptor sets `allowEmpty`     |
//! | `enum`    | one of the declared options                            |
//! | `boolean` | any boolean                                            |
//!
//! A value of the wrong JSON type, or a key missing from the draft, always
//! fails.
//!
//! The function is pure: same schema, draft, and map in, same errors out.

use std::collections::BTreeMap;

use thiserror::Error;

use super::control_map::ControlMap;
use super::schema::{Schema, SettingDescriptor, SettingKind};
use super::value::{SettingValue, SettingsMap};

/// Why a single field failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("value is missing")]
    Missing,

    #[error("expected a {expected} but got a {actual}")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("must be a finite number")]
    NotFinite,

    #[error("must be at least {min}")]
    BelowMinimum { min: f64 },

    #[error("must be at most {max}")]
    AboveMaximum { max: f64 },

    #[error("must not be empty")]
    Empty,

    #[error("must be one of: {}", .options.join(", "))]
    NotAnOption { options: Vec<String> },
}

/// Storage key → reason, for every invalid field.
pub type ValidationErrors = BTreeMap<String, FieldError>;

/// Validates `draft` against `schema`.
///
/// Only descriptors reachable through `key_map` are checked; pass `None` to
/// check every descriptor (used when no UI is bound, e.g. from the CLI).
pub fn validate_draft(
    schema: &Schema,
    draft: &SettingsMap,
    key_map: Option<&ControlMap>,
) -> ValidationErrors {
    schema
        .descriptors()
        .filter(|d| key_map.map_or(true, |m| m.reaches(&d.storage_key)))
        .filter_map(|d| {
            let outcome = match draft.get(&d.storage_key) {
                Some(value) => check_value(d, value),
                None => Err(FieldError::Missing),
            };
            outcome.err().map(|e| (d.storage_key.clone(), e))
        })
        .collect()
}

/// Checks one value against its descriptor.
pub fn check_value(descriptor: &SettingDescriptor, value: &SettingValue) -> Result<(), FieldError> {
    match (descriptor.kind, value) {
        (SettingKind::Boolean, SettingValue::Bool(_)) => Ok(()),

        (SettingKind::Number, SettingValue::Number(n)) => {
            if !n.is_finite() {
                return Err(FieldError::NotFinite);
            }
            if let Some(min) = descriptor.min {
                if *n < min {
                    return Err(FieldError::BelowMinimum { min });
                }
            }
            if let Some(max) = descriptor.max {
                if *n > max {
                    return Err(FieldError::AboveMaximum { max });
                }
            }
            Ok(())
        }

        (SettingKind::String, SettingValue::Text(s)) => {
            if s.trim().is_empty() && !descriptor.allow_empty {
                Err(FieldError::Empty)
            } else {
                Ok(())
            }
        }

        (SettingKind::Enum, SettingValue::Text(s)) => {
            if descriptor.options.iter().any(|o| o == s) {
                Ok(())
            } else {
                Err(FieldError::NotAnOption {
                    options: descriptor.options.clone(),
                })
            }
        }

        (kind, other) => Err(FieldError::WrongType {
            expected: expected_name(kind),
            actual: other.type_name(),
        }),
    }
}

fn expected_name(kind: SettingKind) -> &'static str {
    match kind {
        SettingKind::Boolean => "boolean",
        SettingKind::Number => "number",
        SettingKind::String | SettingKind::Enum => "string",
    }
}
