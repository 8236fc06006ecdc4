//! Domain layer: pure settings types and rules.
//!
//! Nothing in this module touches the file system, the key-value store, or
//! the UI.  The engine crate wires these types to real infrastructure.

pub mod control_map;
pub mod presentation;
pub mod schema;
pub mod validation;
pub mod value;

pub use control_map::ControlMap;
pub use schema::Schema;
pub use value::{SettingValue, SettingsMap};
