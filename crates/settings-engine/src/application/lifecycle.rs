//! SettingsController: the settings panel's lifecycle.
//!
//! The host tells the controller when the panel becomes visible
//! ([`SettingsController::activate`]) and when it goes away
//! ([`SettingsController::deactivate`]).  Between the two, change events from
//! the panel's controls flow into the session and the session's draft flows
//! back into the controls.
//!
//! # Activation (for beginners)
//!
//! ```text
//!  activate()
//!    ├─ session.reload()         saved ← store, draft ← saved   (edits lost)
//!    ├─ ControlBinder::bind()    find controls, start listening
//!    ├─ session.set_key_map()    validate what got bound, plus pending edits
//!    └─ render draft             controls show the draft
//! ```
//!
//! Activation always starts from the store, so calling it twice in a row
//! produces the same state both times.  An activation arriving while the user
//! has unsaved edits wins: the edits are discarded.
//!
//! While inactive, change events are dropped.

use settings_core::{ControlMap, SettingValue};
use tracing::{debug, info};

use super::bind_controls::{BindReport, ControlBinder, ControlEvent, ControlSurface};
use super::draft_state::{
    Confirmation, EditError, ResetOutcome, SaveError, SaveReport, SessionStatus, SettingsSession,
};
use super::settings_store::KeyValueStore;

pub struct SettingsController<S: KeyValueStore, C: ControlSurface> {
    session: SettingsSession<S>,
    surface: C,
    key_map: ControlMap,
    binder: Option<ControlBinder>,
}

impl<S: KeyValueStore, C: ControlSurface> SettingsController<S, C> {
    /// Creates an inactive controller.
    pub fn new(session: SettingsSession<S>, surface: C, key_map: ControlMap) -> Self {
        Self {
            session,
            surface,
            key_map,
            binder: None,
        }
    }

    /// Shows the panel: reloads from the store, binds, and renders.
    pub fn activate(&mut self) -> BindReport {
        if let Some(previous) = self.binder.take() {
            debug!("re-activating; dropping previous bindings");
            previous.unbind(&mut self.surface);
        }

        self.session.reload();
        let (binder, report) =
            ControlBinder::bind_controls(&self.key_map, self.session.schema(), &mut self.surface);
        self.session.set_key_map(Some(binder.effective_map()));
        binder.render_draft_into_controls(self.session.draft(), &mut self.surface);
        self.binder = Some(binder);

        info!(
            "settings panel active: {} control(s) bound, {} missing",
            report.bound.len(),
            report.missing_controls.len()
        );
        report
    }

    /// Hides the panel.  The session keeps its state.
    pub fn deactivate(&mut self) {
        if let Some(binder) = self.binder.take() {
            binder.unbind(&mut self.surface);
            info!("settings panel inactive");
        }
    }

    pub fn is_active(&self) -> bool {
        self.binder.is_some()
    }

    /// Routes a control's change event into the draft.
    ///
    /// Returns `Ok(None)` when the panel is inactive or the control is not
    /// bound.
    pub fn on_control_event(
        &mut self,
        event: &ControlEvent,
    ) -> Result<Option<SessionStatus>, EditError> {
        let Some(binder) = &self.binder else {
            debug!("panel inactive; dropping event from {}", event.control_id);
            return Ok(None);
        };
        binder.handle_change(event, &mut self.session, &self.surface)
    }

    /// Edits a draft key directly and mirrors it into the controls.
    pub fn edit(&mut self, key: &str, value: SettingValue) -> Result<SessionStatus, EditError> {
        let status = self.session.edit(key, value)?;
        self.render();
        Ok(status)
    }

    pub fn save(&mut self) -> Result<SaveReport, SaveError> {
        self.session.save()
    }

    pub fn cancel(&mut self) -> SessionStatus {
        let status = self.session.cancel();
        self.render();
        status
    }

    pub fn reset(&mut self, confirmation: &mut dyn Confirmation) -> ResetOutcome {
        let outcome = self.session.reset(confirmation);
        if matches!(outcome, ResetOutcome::Applied(_)) {
            self.render();
        }
        outcome
    }

    pub fn session(&self) -> &SettingsSession<S> {
        &self.session
    }

    pub fn surface(&self) -> &C {
        &self.surface
    }

    /// Mutable access for hosts that feed user input into the surface.
    pub fn surface_mut(&mut self) -> &mut C {
        &mut self.surface
    }

    fn render(&mut self) {
        if let Some(binder) = &self.binder {
            binder.render_draft_into_controls(self.session.draft(), &mut self.surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use settings_core::{Schema, SettingDescriptor};

    use super::*;
    use crate::application::bind_controls::ControlValue;
    use crate::application::draft_state::SessionOptions;
    use crate::application::settings_store::SettingsStore;
    use crate::infrastructure::confirmation::FixedAnswer;
    use crate::infrastructure::control_surface::MemorySurface;
    use crate::infrastructure::presentation::TracingSink;
    use crate::infrastructure::storage::MemoryStore;

    fn controller_with(surface: MemorySurface) -> SettingsController<MemoryStore, MemorySurface> {
        let schema = Schema::new(vec![
            SettingDescriptor::enumeration("ui.theme", "system", &["system", "light", "dark"]),
            SettingDescriptor::enumeration("ui.language", "en", &["en", "de"]),
            SettingDescriptor::boolean("ui.overlay", true),
            SettingDescriptor::number("home.curatedRows", 3.0, Some(1.0), Some(10.0)),
        ])
        .unwrap();
        let session = SettingsSession::new(
            Arc::new(schema),
            SettingsStore::new(MemoryStore::new(), "watchlist"),
            Box::new(TracingSink),
            SessionOptions::default(),
        );
        SettingsController::new(session, surface, ControlMap::watchlist_default())
    }

    fn controller() -> SettingsController<MemoryStore, MemorySurface> {
        controller_with(MemorySurface::watchlist_panel())
    }

    #[test]
    fn test_activate_renders_saved_values() {
        let mut c = controller();

        c.activate();

        assert!(c.is_active());
        assert_eq!(c.surface().value("#theme-system"), Some(ControlValue::Checked(true)));
        assert_eq!(c.surface().value("#curated-rows"), Some(ControlValue::Text("3".into())));
    }

    #[test]
    fn test_activate_discards_unsaved_edits() {
        // Arrange
        let mut c = controller();
        c.activate();
        c.edit("ui.theme", SettingValue::from("dark")).unwrap();

        // Act
        c.activate();

        // Assert
        assert_eq!(c.session().status(), SessionStatus::Clean);
        assert_eq!(c.session().draft()["ui.theme"], SettingValue::from("system"));
        assert_eq!(c.surface().value("#theme-dark"), Some(ControlValue::Checked(false)));
    }

    #[test]
    fn test_repeated_activation_is_idempotent() {
        let mut c = controller();
        let first = c.activate();
        let state_one = (c.session().saved().clone(), c.session().draft().clone());

        let second = c.activate();
        let state_two = (c.session().saved().clone(), c.session().draft().clone());

        assert_eq!(first, second);
        assert_eq!(state_one, state_two);
    }

    #[test]
    fn test_events_while_inactive_are_ignored() {
        // Arrange: activate, then hide the panel
        let mut c = controller();
        c.activate();
        c.deactivate();

        // Act: the surface no longer listens, but a stray event arrives anyway
        c.surface_mut()
            .user_input("#curated-rows", ControlValue::Text("7".into()));
        let result = c.on_control_event(&ControlEvent {
            control_id: "#curated-rows".into(),
        });

        // Assert
        assert_eq!(result, Ok(None));
        assert_eq!(c.session().status(), SessionStatus::Clean);
        assert!(!c.surface().is_listening("#curated-rows"));
    }

    #[test]
    fn test_event_while_active_edits_draft() {
        let mut c = controller();
        c.activate();

        let event = c
            .surface_mut()
            .user_input("#curated-rows", ControlValue::Text("0".into()))
            .unwrap();
        let status = c.on_control_event(&event).unwrap();

        assert_eq!(status, Some(SessionStatus::DirtyInvalid));
        assert!(!c.session().can_save());
    }

    #[test]
    fn test_save_refuses_invalid_edit_to_key_without_control() {
        // Arrange: the rows control is missing from the page
        let mut surface = MemorySurface::watchlist_panel();
        surface.remove_control("#curated-rows");
        let mut c = controller_with(surface);
        c.activate();
        let status = c.edit("home.curatedRows", SettingValue::Number(0.0)).unwrap();

        // Act
        let result = c.save();

        // Assert
        assert_eq!(status, SessionStatus::DirtyInvalid);
        assert!(matches!(result, Err(SaveError::Blocked { .. })));
        assert_eq!(
            c.session()
                .settings_store()
                .store()
                .get("watchlist:home.curatedRows")
                .as_deref(),
            Some("3.0")
        );
    }

    #[test]
    fn test_cancel_and_reset_rerender_controls() {
        let mut c = controller();
        c.activate();
        c.edit("ui.overlay", SettingValue::Bool(false)).unwrap();
        assert_eq!(c.surface().value("#overlay-toggle"), Some(ControlValue::Checked(false)));

        c.cancel();
        assert_eq!(c.surface().value("#overlay-toggle"), Some(ControlValue::Checked(true)));

        c.edit("ui.theme", SettingValue::from("dark")).unwrap();
        c.save().unwrap();
        c.reset(&mut FixedAnswer(true));
        assert_eq!(c.surface().value("#theme-system"), Some(ControlValue::Checked(true)));
    }
}
