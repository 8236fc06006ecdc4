//! Draft/saved settings state machine.
//!
//! A [`SettingsSession`] holds two snapshots of the user's settings:
//!
//! - `saved` – what is persisted, refreshed from the store on (re)load.
//! - `draft` – what the settings panel currently shows, edited freely.
//!
//! # States (for beginners)
//!
//! ```text
//!            edit (valid)             edit (invalid)
//!  Clean ──────────────► DirtyValid ◄──────────────► DirtyInvalid
//!    ▲                      │   ▲                        │
//!    │        save          │   │ reset (confirmed)      │
//!    ├──────────────────────┘   └──── from any state     │
//!    │        cancel (from either dirty state)           │
//!    └───────────────────────────────────────────────────┘
//! ```
//!
//! - **Edit** changes one draft key and re-validates the whole draft.
//! - **Save** is refused while any field is invalid.  Otherwise every changed
//!   key is written, `saved` catches up, and presentation effects are applied.
//! - **Cancel** throws the draft away and copies `saved` back.
//! - **Reset** (after confirmation) replaces the draft with schema defaults.
//!   Nothing is written until the user saves.
//!
//! # Dirty tracking
//!
//! With [`DirtyTracking::Sticky`] (the default) any edit marks the session
//! dirty until Save or Cancel, even if the user types the original value back.
//! [`DirtyTracking::Exact`] instead compares `draft` with `saved` after every
//! change.
//!
//! # Failed writes
//!
//! A key whose write fails keeps its old `saved` value and its edited `draft`
//! value, so the session stays dirty and the next Save retries it.  `saved`
//! therefore never claims something the store does not hold.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use settings_core::domain::validation::check_value;
use settings_core::{
    validate_draft, ControlMap, EffectKeys, PresentationState, Schema, SettingValue, SettingsMap,
    ValidationErrors,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::settings_store::{KeyValueStore, PersistError, SettingsStore};

/// Receives document-level effects after the saved snapshot changes.
pub trait PresentationSink: Send {
    fn apply(&mut self, state: &PresentationState);
}

/// Blocking yes/no prompt shown before a destructive action.
pub trait Confirmation {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// How the dirty flag is maintained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirtyTracking {
    /// Set by any edit, cleared only by Save, Cancel, or reload.
    #[default]
    Sticky,
    /// Recomputed as `draft != saved` after every change.
    Exact,
}

/// Observable state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Clean,
    DirtyValid,
    DirtyInvalid,
}

#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("no setting with storage key {0}")]
    UnknownKey(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum SaveError {
    /// The draft has invalid fields; nothing was written.
    #[error("save blocked by {} invalid field(s)", .errors.len())]
    Blocked { errors: ValidationErrors },
}

/// Result of a Save that was allowed to run.
#[derive(Debug, Default)]
pub struct SaveReport {
    /// Keys persisted and advanced in `saved`.
    pub written: Vec<String>,
    /// Keys whose write failed; their `saved` value is unchanged.
    pub failed: Vec<(String, PersistError)>,
}

impl SaveReport {
    /// Returns `true` if every changed key was persisted.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The draft now holds the schema defaults.
    Applied(SessionStatus),
    /// The user declined; nothing changed.
    Declined,
}

/// Behaviour knobs for a session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub dirty_tracking: DirtyTracking,
    pub effect_keys: EffectKeys,
}

/// The single owned settings state.
pub struct SettingsSession<S: KeyValueStore> {
    schema: Arc<Schema>,
    store: SettingsStore<S>,
    sink: Box<dyn PresentationSink>,
    options: SessionOptions,
    key_map: Option<ControlMap>,
    saved: SettingsMap,
    draft: SettingsMap,
    dirty: bool,
    errors: ValidationErrors,
}

impl<S: KeyValueStore> SettingsSession<S> {
    /// Creates a session and loads it from the store.
    ///
    /// Missing keys are filled with their defaults first, then `saved` is read
    /// back and `draft` cloned from it.  The session starts `Clean`.
    pub fn new(
        schema: Arc<Schema>,
        store: SettingsStore<S>,
        sink: Box<dyn PresentationSink>,
        options: SessionOptions,
    ) -> Self {
        let mut session = Self {
            schema,
            store,
            sink,
            options,
            key_map: None,
            saved: SettingsMap::new(),
            draft: SettingsMap::new(),
            dirty: false,
            errors: ValidationErrors::new(),
        };
        session.reload();
        session
    }

    /// Re-reads `saved` from the store and rebuilds `draft`.
    ///
    /// Any unsaved edits are discarded.  Calling this repeatedly without
    /// intervening writes yields the same state each time.
    pub fn reload(&mut self) {
        let report = self.store.ensure_defaults(&self.schema);
        if !report.written.is_empty() {
            info!("wrote {} missing default(s)", report.written.len());
        }
        self.saved = self.store.load_all(&self.schema);
        self.draft = self.saved.clone();
        self.dirty = false;
        self.revalidate();
        if !self.errors.is_empty() {
            warn!(
                "persisted settings fail validation: {:?}",
                self.errors.keys().collect::<Vec<_>>()
            );
        }
        self.apply_effects();
    }

    /// Restricts validation to keys reachable through `key_map`.
    ///
    /// `None` validates every schema key.  A key outside the map is still
    /// checked once its draft value differs from `saved`, so Save can never
    /// write a value that breaks its descriptor.
    pub fn set_key_map(&mut self, key_map: Option<ControlMap>) {
        self.key_map = key_map;
        self.revalidate();
    }

    /// Sets one draft key.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::UnknownKey`] if `key` is not in the schema; the
    /// session is left untouched.
    pub fn edit(&mut self, key: &str, value: SettingValue) -> Result<SessionStatus, EditError> {
        if !self.schema.contains(key) {
            return Err(EditError::UnknownKey(key.to_string()));
        }
        debug!("edit {key} = {value}");
        self.draft.insert(key.to_string(), value);
        self.revalidate();
        self.dirty = match self.options.dirty_tracking {
            DirtyTracking::Sticky => true,
            DirtyTracking::Exact => self.draft != self.saved,
        };
        Ok(self.status())
    }

    /// Persists every changed key and makes the draft the new saved snapshot.
    ///
    /// Saving a session with nothing to save is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Blocked`] when the draft has validation errors.
    /// In that case no key is written and `saved` is unchanged.
    pub fn save(&mut self) -> Result<SaveReport, SaveError> {
        if !self.errors.is_empty() {
            warn!("save refused: {} invalid field(s)", self.errors.len());
            return Err(SaveError::Blocked {
                errors: self.errors.clone(),
            });
        }
        if !self.dirty {
            return Ok(SaveReport::default());
        }

        let changed: Vec<(String, SettingValue)> = self
            .draft
            .iter()
            .filter(|(k, v)| self.saved.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut report = SaveReport::default();
        for (key, value) in changed {
            match self.store.write_setting(&key, &value) {
                Ok(()) => {
                    self.saved.insert(key.clone(), value);
                    report.written.push(key);
                }
                Err(e) => {
                    warn!("could not persist {key}: {e}");
                    report.failed.push((key, e));
                }
            }
        }

        self.dirty = self.draft != self.saved;
        info!(
            "saved {} setting(s), {} failed",
            report.written.len(),
            report.failed.len()
        );
        // Effects read `saved`, so they run only once it is up to date.
        self.apply_effects();
        Ok(report)
    }

    /// Discards the draft and copies `saved` back.
    pub fn cancel(&mut self) -> SessionStatus {
        self.draft = self.saved.clone();
        self.dirty = false;
        self.revalidate();
        debug!("draft discarded");
        self.status()
    }

    /// Replaces the draft with schema defaults after confirmation.
    ///
    /// Writes nothing; the user must Save to persist the defaults.
    pub fn reset(&mut self, confirmation: &mut dyn Confirmation) -> ResetOutcome {
        if !confirmation.confirm("Reset all settings to their defaults?") {
            debug!("reset declined");
            return ResetOutcome::Declined;
        }
        self.draft = self.schema.defaults();
        self.revalidate();
        self.dirty = match self.options.dirty_tracking {
            DirtyTracking::Sticky => true,
            DirtyTracking::Exact => self.draft != self.saved,
        };
        info!("draft reset to defaults");
        ResetOutcome::Applied(self.status())
    }

    pub fn status(&self) -> SessionStatus {
        if !self.dirty {
            SessionStatus::Clean
        } else if self.errors.is_empty() {
            SessionStatus::DirtyValid
        } else {
            SessionStatus::DirtyInvalid
        }
    }

    /// Whether the Save action should be enabled.
    pub fn can_save(&self) -> bool {
        self.status() == SessionStatus::DirtyValid
    }

    /// Whether the Cancel action should be enabled.
    pub fn can_cancel(&self) -> bool {
        self.status() != SessionStatus::Clean
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn saved(&self) -> &SettingsMap {
        &self.saved
    }

    pub fn draft(&self) -> &SettingsMap {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn key_map(&self) -> Option<&ControlMap> {
        self.key_map.as_ref()
    }

    pub fn settings_store(&self) -> &SettingsStore<S> {
        &self.store
    }

    /// Presentation effects implied by the current saved snapshot.
    pub fn presentation(&self) -> PresentationState {
        PresentationState::from_saved(&self.saved, &self.options.effect_keys)
    }

    fn revalidate(&mut self) {
        let mut errors = validate_draft(&self.schema, &self.draft, self.key_map.as_ref());
        if self.key_map.is_some() {
            // Pending edits to keys the map cannot reach.
            for (key, value) in &self.draft {
                if errors.contains_key(key) || self.saved.get(key) == Some(value) {
                    continue;
                }
                if let Some(descriptor) = self.schema.get(key) {
                    if let Err(e) = check_value(descriptor, value) {
                        errors.insert(key.clone(), e);
                    }
                }
            }
        }
        self.errors = errors;
    }

    fn apply_effects(&mut self) {
        let state = self.presentation();
        self.sink.apply(&state);
    }
}
