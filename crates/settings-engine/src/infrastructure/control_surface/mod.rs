//! Control surface adapters.
//!
//! A browser host renders controls in the DOM and implements
//! [`ControlSurface`](crate::application::bind_controls::ControlSurface) over
//! it.  This crate ships only the in-memory surface, which backs the CLI and
//! every test.

pub mod memory;

pub use memory::MemorySurface;
