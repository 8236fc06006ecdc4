//! Host command bridge for the settings panel.
//!
//! Exposes the [`SettingsController`] to a host UI (a WebView shell, the CLI)
//! as a small set of async commands.  Only this module references both the
//! application layer and the host-facing DTOs.
//!
//! ```text
//! Host UI                         bridge                     controller
//! ─────────────────────────────────────────────────────────────────────────
//! invoke("activate_panel")  ──►  activate_panel()  ──►  activate()
//! invoke("control_changed") ──►  control_changed() ──►  on_control_event()
//! invoke("save_settings")   ──►  save_settings()   ──►  save()
//!                           ◄──  CommandResult<SaveResultDto>
//! ```
//!
//! # `CommandResult<T>`
//!
//! Every command returns the same envelope:
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..."  }
//! ```
//! When the engine could not start (no schema, unreadable store) the host gets
//! `"settings unavailable: ..."` from [`unavailable`] for every command.
//!
//! # Async Mutex
//!
//! The controller sits behind a `tokio::sync::Mutex`, so concurrent commands
//! are applied one at a time in arrival order, exactly like the single-owner
//! controller itself.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use settings_core::{PresentationState, SettingValue, SettingsMap};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::application::bind_controls::{BindReport, ControlEvent, ControlSurface};
use crate::application::draft_state::{
    Confirmation, PresentationSink, ResetOutcome, SaveError, SettingsSession,
};
use crate::application::lifecycle::SettingsController;
use crate::application::settings_store::{KeyValueStore, SettingsStore, StoreError};
use crate::infrastructure::config::{ConfigError, EngineConfig};
use crate::infrastructure::schema_loader::{SchemaLoadError, SchemaLoader};
use crate::infrastructure::storage::JsonFileStore;

// ── Shared state ──────────────────────────────────────────────────────────────

/// Runtime state shared between commands.
pub struct SettingsAppState<S: KeyValueStore, C: ControlSurface> {
    pub controller: Mutex<SettingsController<S, C>>,
}

impl<S: KeyValueStore, C: ControlSurface> SettingsAppState<S, C> {
    pub fn new(controller: SettingsController<S, C>) -> Arc<Self> {
        Arc::new(Self {
            controller: Mutex::new(controller),
        })
    }
}

/// Fatal errors while starting the engine.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Schema(#[from] SchemaLoadError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Builds a file-backed engine from `config`.
///
/// Loads the schema (awaiting the loader), opens the JSON store, and creates
/// an inactive controller around `surface`.
///
/// # Errors
///
/// Any [`InitError`]; the host should then answer every command with
/// [`unavailable`].
pub async fn bootstrap<C: ControlSurface>(
    config: &EngineConfig,
    loader: &SchemaLoader,
    surface: C,
    sink: Box<dyn PresentationSink>,
) -> Result<Arc<SettingsAppState<JsonFileStore, C>>, InitError> {
    let schema = loader.load().await?;
    let store_path = config.store_path()?;
    let store = JsonFileStore::open(&store_path)?;
    info!("settings store at {}", store_path.display());

    let session = SettingsSession::new(
        schema,
        SettingsStore::new(store, config.storage.namespace.clone()),
        sink,
        config.session_options(),
    );
    let controller = SettingsController::new(session, surface, config.control_map());
    Ok(SettingsAppState::new(controller))
}

/// The answer to every command when the engine failed to start.
pub fn unavailable<T: Serialize>(err: &InitError) -> CommandResult<T> {
    error!("settings unavailable: {err}");
    CommandResult::err(format!("settings unavailable: {err}"))
}

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Everything the settings panel needs to draw itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsSnapshotDto {
    /// `"Clean"`, `"DirtyValid"`, or `"DirtyInvalid"`.
    pub status: String,
    pub dirty: bool,
    pub can_save: bool,
    pub can_cancel: bool,
    pub active: bool,
    pub saved: SettingsMap,
    pub draft: SettingsMap,
    /// Storage key → human-readable message.
    pub errors: BTreeMap<String, String>,
    pub presentation: PresentationState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedWriteDto {
    pub key: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResultDto {
    pub written: Vec<String>,
    pub failed: Vec<FailedWriteDto>,
    pub snapshot: SettingsSnapshotDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResultDto {
    /// `false` when the user declined.
    pub applied: bool,
    pub snapshot: SettingsSnapshotDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindReportDto {
    pub bound: Vec<String>,
    pub missing_controls: Vec<String>,
    pub unknown_keys: Vec<String>,
}

impl From<BindReport> for BindReportDto {
    fn from(report: BindReport) -> Self {
        Self {
            bound: report.bound,
            missing_controls: report.missing_controls,
            unknown_keys: report.unknown_keys,
        }
    }
}

/// Unified response wrapper for every command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    /// `true` if the command completed successfully; `false` on error.
    pub success: bool,
    /// The command's return value, present only when `success` is `true`.
    pub data: Option<T>,
    /// A human-readable error message, present only when `success` is `false`.
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

fn snapshot<S: KeyValueStore, C: ControlSurface>(
    controller: &SettingsController<S, C>,
) -> SettingsSnapshotDto {
    let session = controller.session();
    SettingsSnapshotDto {
        status: format!("{:?}", session.status()),
        dirty: session.is_dirty(),
        can_save: session.can_save(),
        can_cancel: session.can_cancel(),
        active: controller.is_active(),
        saved: session.saved().clone(),
        draft: session.draft().clone(),
        errors: session
            .errors()
            .iter()
            .map(|(k, e)| (k.clone(), e.to_string()))
            .collect(),
        presentation: session.presentation(),
    }
}

/// Interprets text typed by a user or passed on a command line.
///
/// JSON literals (`true`, `5`, `"5"`) keep their type; anything else is taken
/// as plain text, so `dark` needs no quoting.
pub fn parse_input_value(raw: &str) -> SettingValue {
    serde_json::from_str(raw).unwrap_or_else(|_| SettingValue::Text(raw.to_string()))
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn get_settings<S: KeyValueStore, C: ControlSurface>(
    state: Arc<SettingsAppState<S, C>>,
) -> CommandResult<SettingsSnapshotDto> {
    let controller = state.controller.lock().await;
    CommandResult::ok(snapshot(&controller))
}

/// Sets one draft key from raw input (see [`parse_input_value`]).
pub async fn edit_setting<S: KeyValueStore, C: ControlSurface>(
    state: Arc<SettingsAppState<S, C>>,
    key: String,
    raw_value: String,
) -> CommandResult<SettingsSnapshotDto> {
    let mut controller = state.controller.lock().await;
    match controller.edit(&key, parse_input_value(&raw_value)) {
        Ok(_) => CommandResult::ok(snapshot(&controller)),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Forwards a change event from a bound control.
pub async fn control_changed<S: KeyValueStore, C: ControlSurface>(
    state: Arc<SettingsAppState<S, C>>,
    control_id: String,
) -> CommandResult<SettingsSnapshotDto> {
    let mut controller = state.controller.lock().await;
    match controller.on_control_event(&ControlEvent { control_id }) {
        Ok(_) => CommandResult::ok(snapshot(&controller)),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Saves the draft.
///
/// A blocked save is an error listing the invalid fields.  A partial save is
/// a success whose `failed` list is non-empty.
pub async fn save_settings<S: KeyValueStore, C: ControlSurface>(
    state: Arc<SettingsAppState<S, C>>,
) -> CommandResult<SaveResultDto> {
    let mut controller = state.controller.lock().await;
    match controller.save() {
        Ok(report) => CommandResult::ok(SaveResultDto {
            written: report.written,
            failed: report
                .failed
                .into_iter()
                .map(|(key, e)| FailedWriteDto {
                    key,
                    error: e.to_string(),
                })
                .collect(),
            snapshot: snapshot(&controller),
        }),
        Err(SaveError::Blocked { errors }) => {
            let fields: Vec<String> = errors.iter().map(|(k, e)| format!("{k}: {e}")).collect();
            CommandResult::err(format!("save blocked: {}", fields.join("; ")))
        }
    }
}

pub async fn cancel_edits<S: KeyValueStore, C: ControlSurface>(
    state: Arc<SettingsAppState<S, C>>,
) -> CommandResult<SettingsSnapshotDto> {
    let mut controller = state.controller.lock().await;
    controller.cancel();
    CommandResult::ok(snapshot(&controller))
}

/// Resets the draft to defaults if `confirmation` agrees.  Nothing is saved.
pub async fn reset_settings<S: KeyValueStore, C: ControlSurface, K: Confirmation>(
    state: Arc<SettingsAppState<S, C>>,
    mut confirmation: K,
) -> CommandResult<ResetResultDto> {
    let mut controller = state.controller.lock().await;
    let outcome = controller.reset(&mut confirmation);
    CommandResult::ok(ResetResultDto {
        applied: matches!(outcome, ResetOutcome::Applied(_)),
        snapshot: snapshot(&controller),
    })
}

pub async fn activate_panel<S: KeyValueStore, C: ControlSurface>(
    state: Arc<SettingsAppState<S, C>>,
) -> CommandResult<BindReportDto> {
    let mut controller = state.controller.lock().await;
    CommandResult::ok(controller.activate().into())
}

pub async fn deactivate_panel<S: KeyValueStore, C: ControlSurface>(
    state: Arc<SettingsAppState<S, C>>,
) -> CommandResult<()> {
    let mut controller = state.controller.lock().await;
    controller.deactivate();
    CommandResult::ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use settings_core::{ControlMap, Schema};

    use super::*;
    use crate::application::bind_controls::ControlValue;
    use crate::application::draft_state::SessionOptions;
    use crate::infrastructure::confirmation::FixedAnswer;
    use crate::infrastructure::control_surface::MemorySurface;
    use crate::infrastructure::presentation::RecordingSink;
    use crate::infrastructure::schema_loader::EMBEDDED_SCHEMA;
    use crate::infrastructure::storage::MemoryStore;

    type TestState = Arc<SettingsAppState<MemoryStore, MemorySurface>>;

    fn make_state() -> (TestState, RecordingSink) {
        let sink = RecordingSink::new();
        let session = SettingsSession::new(
            Arc::new(Schema::from_json(EMBEDDED_SCHEMA).unwrap()),
            SettingsStore::new(MemoryStore::new(), "watchlist"),
            Box::new(sink.clone()),
            SessionOptions::default(),
        );
        let controller = SettingsController::new(
            session,
            MemorySurface::watchlist_panel(),
            ControlMap::watchlist_default(),
        );
        (SettingsAppState::new(controller), sink)
    }

    #[tokio::test]
    async fn test_get_settings_starts_clean() {
        // Arrange
        let (state, _) = make_state();

        // Act
        let result = get_settings(state).await;

        // Assert
        assert!(result.success);
        let dto = result.data.unwrap();
        assert_eq!(dto.status, "Clean");
        assert!(!dto.can_save);
        assert!(!dto.can_cancel);
        assert_eq!(dto.presentation.theme.as_deref(), Some("system"));
    }

    #[tokio::test]
    async fn test_edit_then_save_updates_presentation() {
        // Arrange
        let (state, sink) = make_state();
        edit_setting(Arc::clone(&state), "ui.theme".into(), "dark".into()).await;

        // Act
        let result = save_settings(Arc::clone(&state)).await;

        // Assert
        assert!(result.success);
        let dto = result.data.unwrap();
        assert_eq!(dto.written, vec!["ui.theme".to_string()]);
        assert_eq!(dto.snapshot.status, "Clean");
        assert_eq!(sink.last().unwrap().theme.as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_blocked_save_names_the_invalid_field() {
        let (state, _) = make_state();
        let edit = edit_setting(Arc::clone(&state), "home.curatedRows".into(), "0".into()).await;
        assert_eq!(edit.data.unwrap().errors["home.curatedRows"], "must be at least 1");

        let result = save_settings(state).await;

        assert!(!result.success);
        assert_eq!(
            result.error.unwrap(),
            "save blocked: home.curatedRows: must be at least 1"
        );
    }

    #[tokio::test]
    async fn test_edit_unknown_key_is_an_error() {
        let (state, _) = make_state();

        let result = edit_setting(state, "ui.fontSize".into(), "12".into()).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("ui.fontSize"));
    }

    #[tokio::test]
    async fn test_declined_reset_reports_not_applied() {
        let (state, _) = make_state();
        edit_setting(Arc::clone(&state), "ui.theme".into(), "light".into()).await;

        let result = reset_settings(Arc::clone(&state), FixedAnswer(false)).await;

        let dto = result.data.unwrap();
        assert!(!dto.applied);
        assert_eq!(dto.snapshot.draft["ui.theme"], SettingValue::from("light"));
    }

    #[tokio::test]
    async fn test_control_changed_after_activation_edits_draft() {
        // Arrange
        let (state, _) = make_state();
        let report = activate_panel(Arc::clone(&state)).await.data.unwrap();
        assert!(report.missing_controls.is_empty());
        state
            .controller
            .lock()
            .await
            .surface_mut()
            .user_input("#overlay-toggle", ControlValue::Checked(false));

        // Act
        let result = control_changed(Arc::clone(&state), "#overlay-toggle".into()).await;

        // Assert
        let dto = result.data.unwrap();
        assert_eq!(dto.draft["ui.overlay"], SettingValue::Bool(false));
        assert_eq!(dto.status, "DirtyValid");
    }

    #[tokio::test]
    async fn test_deactivate_panel_marks_inactive() {
        let (state, _) = make_state();
        activate_panel(Arc::clone(&state)).await;

        deactivate_panel(Arc::clone(&state)).await;

        assert!(!get_settings(state).await.data.unwrap().active);
    }

    #[test]
    fn test_parse_input_value_keeps_json_types() {
        assert_eq!(parse_input_value("true"), SettingValue::Bool(true));
        assert_eq!(parse_input_value("5"), SettingValue::Number(5.0));
        assert_eq!(parse_input_value("\"5\""), SettingValue::from("5"));
        assert_eq!(parse_input_value("dark"), SettingValue::from("dark"));
    }

    #[test]
    fn test_unavailable_wraps_init_error() {
        let err = InitError::Schema(SchemaLoadError::NotFound {
            path: "schema.json".into(),
        });

        let result: CommandResult<()> = unavailable(&err);

        assert!(!result.success);
        assert_eq!(
            result.error.unwrap(),
            "settings unavailable: schema document not found at schema.json"
        );
    }

    #[test]
    fn test_command_result_ok_sets_success_true() {
        let r: CommandResult<u32> = CommandResult::ok(7);
        assert!(r.success);
        assert_eq!(r.data, Some(7));
        assert!(r.error.is_none());
    }
}
