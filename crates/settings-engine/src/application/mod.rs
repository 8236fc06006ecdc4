//! Application layer use cases for the settings engine.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure rules in `settings-core`) and the infrastructure (files, UI, prompts).
//! Use cases here depend on traits, never on concrete adapters, so every
//! transition can be tested without a browser or a disk.
//!
//! # Sub-modules
//!
//! - **`settings_store`** – Namespaced, JSON-encoded reads and writes on top
//!   of a [`KeyValueStore`](settings_store::KeyValueStore).
//!
//! - **`draft_state`** – The draft/saved state machine: edit, save, cancel,
//!   reset, with validation gating Save.
//!
//! - **`bind_controls`** – Pushes the draft into UI controls and reads
//!   control changes back into the draft.
//!
//! - **`lifecycle`** – Ties session and binder together and reacts to the
//!   host's activate/deactivate signal.

pub mod bind_controls;
pub mod draft_state;
pub mod lifecycle;
pub mod settings_store;
