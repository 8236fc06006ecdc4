//! In-memory control surface.
//!
//! # Why an in-memory surface?
//!
//! The binder only needs to find controls, show values, read values back, and
//! know which controls it listens to.  `MemorySurface` keeps all of that in
//! two maps, so tests and the CLI can drive the full bind/render/edit cycle
//! without a UI toolkit.
//!
//! "User" input is simulated with [`MemorySurface::user_input`] and
//! [`MemorySurface::select_exclusive`].  Both return the [`ControlEvent`] a
//! real UI would fire, or `None` when nobody listens to that control.

use std::collections::{BTreeMap, BTreeSet};

use crate::application::bind_controls::{ControlEvent, ControlSurface, ControlValue};

#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    controls: BTreeMap<String, ControlValue>,
    listening: BTreeSet<String>,
    renders: usize,
}

impl MemorySurface {
    /// Creates a surface with no controls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a control with an initial value.  Returns `self` for chaining.
    pub fn with_control(mut self, control_id: &str, initial: ControlValue) -> Self {
        self.controls.insert(control_id.to_string(), initial);
        self
    }

    /// The watchlist settings panel with every control blank.
    pub fn watchlist_panel() -> Self {
        Self::new()
            .with_control("#theme-system", ControlValue::Checked(false))
            .with_control("#theme-light", ControlValue::Checked(false))
            .with_control("#theme-dark", ControlValue::Checked(false))
            .with_control("#language-select", ControlValue::Text(String::new()))
            .with_control("#overlay-toggle", ControlValue::Checked(false))
            .with_control("#curated-rows", ControlValue::Text(String::new()))
    }

    pub fn remove_control(&mut self, control_id: &str) {
        self.controls.remove(control_id);
        self.listening.remove(control_id);
    }

    /// Current value of a control.
    pub fn value(&self, control_id: &str) -> Option<ControlValue> {
        self.controls.get(control_id).cloned()
    }

    pub fn is_listening(&self, control_id: &str) -> bool {
        self.listening.contains(control_id)
    }

    /// Number of `render` calls received so far.
    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// Simulates the user changing a control.
    ///
    /// Unknown controls are ignored.
    pub fn user_input(&mut self, control_id: &str, value: ControlValue) -> Option<ControlEvent> {
        let slot = self.controls.get_mut(control_id)?;
        *slot = value;
        self.event_for(control_id)
    }

    /// Simulates clicking one radio button of a group: `chosen` is checked and
    /// every other member of `group` is unchecked.
    pub fn select_exclusive(&mut self, group: &[&str], chosen: &str) -> Option<ControlEvent> {
        for id in group {
            if let Some(slot) = self.controls.get_mut(*id) {
                *slot = ControlValue::Checked(*id == chosen);
            }
        }
        self.event_for(chosen)
    }

    fn event_for(&self, control_id: &str) -> Option<ControlEvent> {
        self.listening.contains(control_id).then(|| ControlEvent {
            control_id: control_id.to_string(),
        })
    }
}

impl ControlSurface for MemorySurface {
    fn has_control(&self, control_id: &str) -> bool {
        self.controls.contains_key(control_id)
    }

    fn render(&mut self, control_id: &str, value: &ControlValue) {
        if let Some(slot) = self.controls.get_mut(control_id) {
            *slot = value.clone();
            self.renders += 1;
        }
    }

    fn read_value(&self, control_id: &str) -> Option<ControlValue> {
        self.value(control_id)
    }

    fn listen(&mut self, control_id: &str) {
        if self.controls.contains_key(control_id) {
            self.listening.insert(control_id.to_string());
        }
    }

    fn unlisten(&mut self, control_id: &str) {
        self.listening.remove(control_id);
    }
}
