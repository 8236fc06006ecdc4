//! settings-engine library crate.
//!
//! Implements the settings panel of the watchlist app: a draft/saved state
//! machine over a schema of user preferences, a binder that keeps UI controls
//! and the draft in sync, and the storage adapters behind them.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Host shell (UI, CLI)
//!         ↕
//! [settings-engine]
//!   ├── application/      Session state machine, control binder, lifecycle
//!   └── infrastructure/
//!         ├── storage/          Key-value stores (memory, JSON file)
//!         ├── schema_loader     Async, cached schema document loading
//!         ├── config            TOML engine configuration
//!         ├── control_surface/  In-memory control surface adapter
//!         ├── presentation      Document-effect sinks
//!         ├── confirmation      Yes/no prompt adapters
//!         └── ui_bridge/        Host commands and DTOs
//! ```
//!
//! # Layer rules
//!
//! - `application` depends on `settings-core` and its own collaborator traits
//!   (`KeyValueStore`, `ControlSurface`, `PresentationSink`, `Confirmation`).
//! - `infrastructure` implements those traits and may depend on everything.

pub mod application;
pub mod infrastructure;
