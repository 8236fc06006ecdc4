//! Infrastructure layer for the settings engine.
//!
//! Contains the adapters behind the application layer's traits: key-value
//! stores, the schema loader, the TOML engine config, the in-memory control
//! surface, presentation sinks, confirmation prompts, and the host command
//! bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `settings_core`, but MUST NOT be imported by the `application` layer.

pub mod config;
pub mod confirmation;
pub mod control_surface;
pub mod presentation;
pub mod schema_loader;
pub mod storage;
pub mod ui_bridge;
