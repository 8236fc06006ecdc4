//! Presentation sinks.
//!
//! In the browser the saved theme becomes a `data-theme` attribute, the
//! language becomes `lang`, and the overlay flag toggles a class.  Outside a
//! browser there is no document, so the engine either logs the effects
//! ([`TracingSink`]) or records them for later inspection ([`RecordingSink`]).

use std::sync::{Arc, Mutex};

use settings_core::PresentationState;
use tracing::info;

use crate::application::draft_state::PresentationSink;

/// Logs every applied presentation state at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl PresentationSink for TracingSink {
    fn apply(&mut self, state: &PresentationState) {
        info!(
            theme = state.theme.as_deref().unwrap_or("-"),
            language = state.language.as_deref().unwrap_or("-"),
            overlay = ?state.overlay,
            "presentation updated"
        );
    }
}

/// Keeps every applied state.  Clones share the same history.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    history: Arc<Mutex<Vec<PresentationState>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently applied state, if any.
    pub fn last(&self) -> Option<PresentationState> {
        self.history.lock().ok().and_then(|h| h.last().cloned())
    }

    /// How many times effects have been applied.
    pub fn count(&self) -> usize {
        self.history.lock().map(|h| h.len()).unwrap_or(0)
    }
}

impl PresentationSink for RecordingSink {
    fn apply(&mut self, state: &PresentationState) {
        if let Ok(mut history) = self.history.lock() {
            history.push(state.clone());
        }
    }
}
