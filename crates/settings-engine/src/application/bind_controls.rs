//! ControlBinder: keeps UI controls and the settings draft in sync.
//!
//! The binder never touches a real UI toolkit.  It talks to a
//! [`ControlSurface`], a small capability trait the host implements for its
//! UI (a DOM adapter in the browser, [`MemorySurface`] in tests and the CLI).
//!
//! [`MemorySurface`]: crate::infrastructure::control_surface::MemorySurface
//!
//! # Data flow
//!
//! ```text
//!   draft ──render_draft_into_controls──► controls
//!   draft ◄──handle_change / read_controls_into_draft── controls
//! ```
//!
//! # Coercion
//!
//! Controls hold text or a checked flag.  Reading a control back converts the
//! raw value according to the setting's kind:
//!
//! | Kind            | Conversion                                             |
//! |-----------------|--------------------------------------------------------|
//! | number          | parse as `f64`; unparsable/NaN falls back to default   |
//! | boolean         | checked flag, or text other than `""`/`"false"`/`"0"`  |
//! | string / enum   | text passed through unchanged                          |
//!
//! Exclusive groups read as the value of whichever member is checked.

use settings_core::{
    ControlMap, ExclusiveChoice, Schema, SettingDescriptor, SettingKind, SettingValue, SettingsMap,
};
use tracing::{debug, warn};

use super::draft_state::{EditError, SessionStatus, SettingsSession};
use super::settings_store::KeyValueStore;

/// The raw value shown by a control.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    /// Text inputs, selects, number fields.
    Text(String),
    /// Checkboxes and radio buttons.
    Checked(bool),
}

/// A change notification forwarded by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlEvent {
    pub control_id: String,
}

/// Capability interface over the host UI.
pub trait ControlSurface: Send {
    /// Returns `true` if a control with this identifier exists.
    fn has_control(&self, control_id: &str) -> bool;
    /// Displays `value` in the control.
    fn render(&mut self, control_id: &str, value: &ControlValue);
    /// Reads the control's current value.
    fn read_value(&self, control_id: &str) -> Option<ControlValue>;
    /// Starts forwarding change events for the control.
    fn listen(&mut self, control_id: &str);
    /// Stops forwarding change events for the control.
    fn unlisten(&mut self, control_id: &str);
}

/// What happened while binding a control map.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BindReport {
    /// Control identifiers now bound.
    pub bound: Vec<String>,
    /// Control identifiers not found on the surface.
    pub missing_controls: Vec<String>,
    /// Storage keys referenced by the map but absent from the schema.
    pub unknown_keys: Vec<String>,
}

#[derive(Debug, Clone)]
enum Binding {
    Single {
        control_id: String,
        descriptor: SettingDescriptor,
    },
    Group {
        descriptor: SettingDescriptor,
        choices: Vec<ExclusiveChoice>,
    },
}

impl Binding {
    fn storage_key(&self) -> &str {
        match self {
            Binding::Single { descriptor, .. } | Binding::Group { descriptor, .. } => {
                &descriptor.storage_key
            }
        }
    }

    fn control_ids(&self) -> Vec<&str> {
        match self {
            Binding::Single { control_id, .. } => vec![control_id.as_str()],
            Binding::Group { choices, .. } => {
                choices.iter().map(|c| c.control_id.as_str()).collect()
            }
        }
    }

    fn owns(&self, control_id: &str) -> bool {
        self.control_ids().contains(&control_id)
    }
}

/// Controls successfully bound for one activation of the settings panel.
#[derive(Debug, Default)]
pub struct ControlBinder {
    bindings: Vec<Binding>,
}

impl ControlBinder {
    /// Locates every control of `key_map` on `surface` and starts listening.
    ///
    /// Controls that are missing, or whose storage key is not in `schema`, are
    /// skipped with a warning and listed in the returned [`BindReport`].  A
    /// group is bound with whichever of its members exist.
    pub fn bind_controls(
        key_map: &ControlMap,
        schema: &Schema,
        surface: &mut dyn ControlSurface,
    ) -> (Self, BindReport) {
        let mut report = BindReport::default();
        let mut bindings = Vec::new();

        for control in &key_map.controls {
            let Some(descriptor) = schema.get(&control.storage_key) else {
                warn!(
                    "control {} references unknown setting {}; skipped",
                    control.control_id, control.storage_key
                );
                report.unknown_keys.push(control.storage_key.clone());
                continue;
            };
            if !surface.has_control(&control.control_id) {
                warn!("control {} not found; skipped", control.control_id);
                report.missing_controls.push(control.control_id.clone());
                continue;
            }
            surface.listen(&control.control_id);
            report.bound.push(control.control_id.clone());
            bindings.push(Binding::Single {
                control_id: control.control_id.clone(),
                descriptor: descriptor.clone(),
            });
        }

        for group in &key_map.groups {
            let Some(descriptor) = schema.get(&group.storage_key) else {
                warn!("control group references unknown setting {}; skipped", group.storage_key);
                report.unknown_keys.push(group.storage_key.clone());
                continue;
            };
            let mut present = Vec::new();
            for choice in &group.choices {
                if surface.has_control(&choice.control_id) {
                    surface.listen(&choice.control_id);
                    report.bound.push(choice.control_id.clone());
                    present.push(choice.clone());
                } else {
                    warn!("control {} not found; skipped", choice.control_id);
                    report.missing_controls.push(choice.control_id.clone());
                }
            }
            if !present.is_empty() {
                bindings.push(Binding::Group {
                    descriptor: descriptor.clone(),
                    choices: present,
                });
            }
        }

        debug!(
            "bound {} control(s), {} missing",
            report.bound.len(),
            report.missing_controls.len()
        );
        (Self { bindings }, report)
    }

    /// Stops listening on every bound control.
    pub fn unbind(&self, surface: &mut dyn ControlSurface) {
        for binding in &self.bindings {
            for id in binding.control_ids() {
                surface.unlisten(id);
            }
        }
    }

    /// The part of the requested map that actually got bound.
    ///
    /// The session validates exactly these keys.
    pub fn effective_map(&self) -> ControlMap {
        let mut map = ControlMap::new();
        for binding in &self.bindings {
            match binding {
                Binding::Single { control_id, descriptor } => {
                    map = map.bind(control_id, &descriptor.storage_key);
                }
                Binding::Group { descriptor, choices } => {
                    let pairs: Vec<(&str, &str)> = choices
                        .iter()
                        .map(|c| (c.control_id.as_str(), c.value.as_str()))
                        .collect();
                    map = map.group(&descriptor.storage_key, &pairs);
                }
            }
        }
        map
    }

    /// Returns `true` if `control_id` belongs to a bound control or group.
    pub fn is_bound(&self, control_id: &str) -> bool {
        self.bindings.iter().any(|b| b.owns(control_id))
    }

    /// Pushes every draft value into its control.
    pub fn render_draft_into_controls(&self, draft: &SettingsMap, surface: &mut dyn ControlSurface) {
        for binding in &self.bindings {
            let Some(value) = draft.get(binding.storage_key()) else {
                continue;
            };
            match binding {
                Binding::Single { control_id, .. } => {
                    surface.render(control_id, &to_control_value(value));
                }
                Binding::Group { choices, .. } => {
                    for choice in choices {
                        let selected = value.as_str() == Some(choice.value.as_str());
                        surface.render(&choice.control_id, &ControlValue::Checked(selected));
                    }
                }
            }
        }
    }

    /// Applies one change event to the session.
    ///
    /// Returns `Ok(None)` when the event does not belong to a bound control or
    /// the control has no readable value (e.g. a group with nothing checked).
    pub fn handle_change<S: KeyValueStore>(
        &self,
        event: &ControlEvent,
        session: &mut SettingsSession<S>,
        surface: &dyn ControlSurface,
    ) -> Result<Option<SessionStatus>, EditError> {
        let Some(binding) = self.bindings.iter().find(|b| b.owns(&event.control_id)) else {
            debug!("ignoring change from unbound control {}", event.control_id);
            return Ok(None);
        };
        match read_binding(binding, surface) {
            Some(value) => session.edit(binding.storage_key(), value).map(Some),
            None => Ok(None),
        }
    }

    /// Reads every bound control and edits the draft where it differs.
    ///
    /// Returns the number of keys edited.
    pub fn read_controls_into_draft<S: KeyValueStore>(
        &self,
        session: &mut SettingsSession<S>,
        surface: &dyn ControlSurface,
    ) -> Result<usize, EditError> {
        let mut edited = 0;
        for binding in &self.bindings {
            let Some(value) = read_binding(binding, surface) else {
                continue;
            };
            if session.draft().get(binding.storage_key()) != Some(&value) {
                session.edit(binding.storage_key(), value)?;
                edited += 1;
            }
        }
        Ok(edited)
    }
}

fn read_binding(binding: &Binding, surface: &dyn ControlSurface) -> Option<SettingValue> {
    match binding {
        Binding::Single {
            control_id,
            descriptor,
        } => surface
            .read_value(control_id)
            .map(|raw| coerce(descriptor, &raw)),
        Binding::Group { choices, .. } => choices
            .iter()
            .find(|c| surface.read_value(&c.control_id) == Some(ControlValue::Checked(true)))
            .map(|c| SettingValue::Text(c.value.clone())),
    }
}

fn to_control_value(value: &SettingValue) -> ControlValue {
    match value {
        SettingValue::Bool(b) => ControlValue::Checked(*b),
        other => ControlValue::Text(other.to_string()),
    }
}

/// Converts a raw control value into a setting value for `descriptor`.
pub fn coerce(descriptor: &SettingDescriptor, raw: &ControlValue) -> SettingValue {
    match descriptor.kind {
        SettingKind::Number => {
            let parsed = match raw {
                ControlValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
                ControlValue::Checked(_) => None,
            };
            match parsed {
                Some(n) => SettingValue::Number(n),
                None => {
                    debug!(
                        "unparsable number for {}; using default",
                        descriptor.storage_key
                    );
                    descriptor.default.clone()
                }
            }
        }
        SettingKind::Boolean => SettingValue::Bool(match raw {
            ControlValue::Checked(b) => *b,
            ControlValue::Text(s) => !matches!(s.trim(), "" | "false" | "0"),
        }),
        SettingKind::String | SettingKind::Enum => match raw {
            ControlValue::Text(s) => SettingValue::Text(s.clone()),
            ControlValue::Checked(b) => SettingValue::Text(b.to_string()),
        },
    }
}
