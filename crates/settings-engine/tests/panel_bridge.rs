//! Drives the settings panel the way a host shell does: bootstrap from a
//! config, activate the panel, forward control events, and save.

use std::path::PathBuf;
use std::sync::Arc;

use settings_core::SettingValue;
use settings_engine::application::bind_controls::ControlValue;
use settings_engine::application::settings_store::KeyValueStore;
use settings_engine::infrastructure::config::EngineConfig;
use settings_engine::infrastructure::control_surface::MemorySurface;
use settings_engine::infrastructure::presentation::RecordingSink;
use settings_engine::infrastructure::schema_loader::SchemaLoader;
use settings_engine::infrastructure::storage::JsonFileStore;
use settings_engine::infrastructure::ui_bridge::{
    activate_panel, bootstrap, cancel_edits, control_changed, get_settings, save_settings,
    unavailable, SettingsAppState,
};

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("panel_bridge_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config_in(dir: &std::path::Path) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.storage.store_path = Some(dir.join("store.json"));
    config
}

async fn start(
    config: &EngineConfig,
    sink: RecordingSink,
) -> Arc<SettingsAppState<JsonFileStore, MemorySurface>> {
    let loader = SchemaLoader::from_optional_path(None);
    bootstrap(config, &loader, MemorySurface::watchlist_panel(), Box::new(sink))
        .await
        .expect("bootstrap succeeds")
}

async fn user_input(
    state: &Arc<SettingsAppState<JsonFileStore, MemorySurface>>,
    control_id: &str,
    value: ControlValue,
) {
    state
        .controller
        .lock()
        .await
        .surface_mut()
        .user_input(control_id, value)
        .expect("control is bound");
}

#[tokio::test]
async fn test_curated_rows_scenario_through_controls() {
    // Arrange
    let dir = temp_dir();
    let config = config_in(&dir);
    let state = start(&config, RecordingSink::new()).await;
    let report = activate_panel(Arc::clone(&state)).await.data.unwrap();
    assert!(report.missing_controls.is_empty());
    assert!(report.unknown_keys.is_empty());

    // Act / Assert: 0 is rejected
    user_input(&state, "#curated-rows", ControlValue::Text("0".into())).await;
    let dto = control_changed(Arc::clone(&state), "#curated-rows".into())
        .await
        .data
        .unwrap();
    assert_eq!(dto.status, "DirtyInvalid");
    assert!(!save_settings(Arc::clone(&state)).await.success);

    // Cancel puts 3 back into the control
    let dto = cancel_edits(Arc::clone(&state)).await.data.unwrap();
    assert_eq!(dto.draft["home.curatedRows"], SettingValue::Number(3.0));
    assert_eq!(
        state.controller.lock().await.surface().value("#curated-rows"),
        Some(ControlValue::Text("3".into()))
    );

    // 5 saves and lands in the file
    user_input(&state, "#curated-rows", ControlValue::Text("5".into())).await;
    control_changed(Arc::clone(&state), "#curated-rows".into()).await;
    let saved = save_settings(Arc::clone(&state)).await.data.unwrap();
    assert_eq!(saved.written, vec!["home.curatedRows".to_string()]);

    let on_disk = JsonFileStore::open(dir.join("store.json")).unwrap();
    assert_eq!(on_disk.get("watchlist:home.curatedRows").as_deref(), Some("5.0"));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_theme_radio_change_applies_presentation_after_save() {
    let dir = temp_dir();
    let sink = RecordingSink::new();
    let state = start(&config_in(&dir), sink.clone()).await;
    activate_panel(Arc::clone(&state)).await;

    let event = state
        .controller
        .lock()
        .await
        .surface_mut()
        .select_exclusive(&["#theme-system", "#theme-light", "#theme-dark"], "#theme-dark")
        .expect("radio is bound");
    control_changed(Arc::clone(&state), event.control_id).await;
    assert_eq!(sink.last().unwrap().theme.as_deref(), Some("system"));

    save_settings(Arc::clone(&state)).await;

    assert_eq!(sink.last().unwrap().theme.as_deref(), Some("dark"));
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_second_host_sees_values_saved_by_first() {
    // Arrange
    let dir = temp_dir();
    let config = config_in(&dir);
    let first = start(&config, RecordingSink::new()).await;
    {
        let mut controller = first.controller.lock().await;
        controller.edit("ui.language", SettingValue::from("de")).unwrap();
        controller.save().unwrap();
    }

    // Act
    let second = start(&config, RecordingSink::new()).await;
    activate_panel(Arc::clone(&second)).await;
    let dto = get_settings(Arc::clone(&second)).await.data.unwrap();

    // Assert
    assert_eq!(dto.saved["ui.language"], SettingValue::from("de"));
    assert_eq!(
        second.controller.lock().await.surface().value("#language-select"),
        Some(ControlValue::Text("de".into()))
    );
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_missing_schema_makes_settings_unavailable() {
    let dir = temp_dir();
    let config = config_in(&dir);
    let loader = SchemaLoader::from_optional_path(Some(dir.join("absent.json")));

    let err = match bootstrap(
        &config,
        &loader,
        MemorySurface::watchlist_panel(),
        Box::new(RecordingSink::new()),
    )
    .await
    {
        Ok(_) => panic!("bootstrap must fail without a schema"),
        Err(e) => e,
    };
    let result = unavailable::<()>(&err);

    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("settings unavailable:"));
    std::fs::remove_dir_all(&dir).ok();
}
