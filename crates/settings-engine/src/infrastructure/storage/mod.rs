//! Storage infrastructure: key-value store adapters.
//!
//! - `memory`    – a `HashMap` store with an optional byte quota, used by
//!   tests and by hosts that keep settings only for the session.
//! - `json_file` – a single JSON object on disk, the desktop counterpart of
//!   browser `localStorage`.
//!
//! Both implement [`KeyValueStore`](crate::application::settings_store::KeyValueStore),
//! so the session never knows which one it talks to.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
