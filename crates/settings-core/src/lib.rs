//! # settings-core
//!
//! Shared library for the watchlist settings engine containing the setting
//! value model, the schema of user preferences, the draft validator, and the
//! control map that ties UI controls to storage keys.
//!
//! This crate has zero dependencies on storage, UI frameworks, or async
//! runtimes.  Everything here is a pure function of its inputs.
//!
//! # Architecture overview (for beginners)
//!
//! The settings panel of the watchlist app lets a user edit preferences such
//! as the colour theme or how many curated rows appear on the home page.
//! Edits go into a *draft* first and are only written to storage when the
//! user presses Save.  Before Save is allowed, the draft is validated against
//! the *schema*.
//!
//! This crate defines:
//!
//! - **`domain::value`** – The typed values a setting can hold
//!   (boolean, number, text) and the snapshot map type.
//!
//! - **`domain::schema`** – Setting descriptors and the [`Schema`] parsed
//!   from the JSON schema document.
//!
//! - **`domain::validation`** – [`validate_draft`], the pure validator that
//!   gates the Save action.
//!
//! - **`domain::control_map`** – Which UI control edits which setting,
//!   including radio-style exclusive groups.
//!
//! - **`domain::presentation`** – The document-level effects (theme,
//!   language, overlay) derived from a saved snapshot.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `settings_core::Schema` instead of `settings_core::domain::schema::Schema`.
pub use domain::control_map::{ControlBinding, ControlMap, ExclusiveChoice, ExclusiveGroup};
pub use domain::presentation::{EffectKeys, PresentationState};
pub use domain::schema::{Schema, SchemaError, SettingDescriptor, SettingKind};
pub use domain::validation::{validate_draft, FieldError, ValidationErrors};
pub use domain::value::{SettingValue, SettingsMap};
