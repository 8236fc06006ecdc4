//! Control map: which UI control edits which setting.
//!
//! Most controls edit exactly one setting (a text box, a checkbox, a select).
//! An [`ExclusiveGroup`] is the radio-button case: several controls share one
//! storage key and each stands for one enumerated value.  Checking
//! `#theme-dark` means `ui.theme = "dark"`.
//!
//! The map is plain data.  It can be deserialized from the engine's TOML
//! config, so a host can rename or drop controls without touching code.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A single control bound to a single storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlBinding {
    /// Selector-like identifier of the control (e.g. `#curated-rows`).
    pub control_id: String,
    pub storage_key: String,
}

/// One member of an exclusive group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusiveChoice {
    pub control_id: String,
    /// The enumerated value this control selects.
    pub value: String,
}

/// Mutually exclusive controls that together edit one storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusiveGroup {
    pub storage_key: String,
    pub choices: Vec<ExclusiveChoice>,
}

/// The full table of control → storage key associations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMap {
    #[serde(default)]
    pub controls: Vec<ControlBinding>,
    #[serde(default)]
    pub groups: Vec<ExclusiveGroup>,
}

impl ControlMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single-control binding.  Returns `self` for chaining.
    pub fn bind(mut self, control_id: &str, storage_key: &str) -> Self {
        self.controls.push(ControlBinding {
            control_id: control_id.to_string(),
            storage_key: storage_key.to_string(),
        });
        self
    }

    /// Adds an exclusive group of `(control_id, value)` choices.
    pub fn group(mut self, storage_key: &str, choices: &[(&str, &str)]) -> Self {
        self.groups.push(ExclusiveGroup {
            storage_key: storage_key.to_string(),
            choices: choices
                .iter()
                .map(|(id, value)| ExclusiveChoice {
                    control_id: id.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        });
        self
    }

    /// The settings panel of the watchlist app.
    pub fn watchlist_default() -> Self {
        Self::new()
            .group(
                "ui.theme",
                &[
                    ("#theme-system", "system"),
                    ("#theme-light", "light"),
                    ("#theme-dark", "dark"),
                ],
            )
            .bind("#language-select", "ui.language")
            .bind("#overlay-toggle", "ui.overlay")
            .bind("#curated-rows", "home.curatedRows")
    }

    /// Every storage key reachable through a control.
    pub fn storage_keys(&self) -> BTreeSet<&str> {
        self.controls
            .iter()
            .map(|c| c.storage_key.as_str())
            .chain(self.groups.iter().map(|g| g.storage_key.as_str()))
            .collect()
    }

    /// Returns `true` if some control or group edits `storage_key`.
    pub fn reaches(&self, storage_key: &str) -> bool {
        self.controls.iter().any(|c| c.storage_key == storage_key)
            || self.groups.iter().any(|g| g.storage_key == storage_key)
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty() && self.groups.is_empty()
    }
}
