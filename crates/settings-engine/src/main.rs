//! settings-engine: command-line host for the watchlist settings panel.
//!
//! Runs the same commands a UI host would invoke, against the JSON file store,
//! and prints each `CommandResult` as JSON on stdout.  Logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! settings-engine [OPTIONS] <COMMAND>
//!
//! Commands:
//!   show                   Print saved values, draft, errors, and status
//!   set <KEY> <VALUE>      Edit one setting and save it
//!   reset [--yes]          Reset every setting to its default and save
//!   validate               Check the persisted values against the schema
//!   init-config [--force]  Write the effective config to the config file
//!
//! Options:
//!   --config <PATH>   Engine config file   [env: SETTINGS_ENGINE_CONFIG]
//!   --schema <PATH>   Schema document      [env: SETTINGS_ENGINE_SCHEMA]
//!   --store  <PATH>   JSON settings store  [env: SETTINGS_ENGINE_STORE]
//! ```
//!
//! `VALUE` is read as a JSON literal when it is one (`true`, `5`), otherwise
//! as plain text (`dark`).
//!
//! `init-config` writes the config after `--schema` and `--store` overrides are
//! applied, to `--config` or the platform default path.  An existing file is
//! kept unless `--force` is given.
//!
//! The exit status is 0 when the command succeeded and 1 otherwise, including
//! a blocked save and a validation failure.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use settings_engine::infrastructure::config::{
    config_file_path, load_config, save_config, EngineConfig,
};
use settings_engine::infrastructure::confirmation::{FixedAnswer, PromptConfirmation};
use settings_engine::infrastructure::control_surface::MemorySurface;
use settings_engine::infrastructure::presentation::TracingSink;
use settings_engine::infrastructure::schema_loader::SchemaLoader;
use settings_engine::infrastructure::ui_bridge::{
    bootstrap, edit_setting, get_settings, reset_settings, save_settings, unavailable,
    CommandResult,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "settings-engine",
    about = "Inspect and change watchlist settings from the command line",
    version
)]
struct Cli {
    /// Engine config file.  Defaults to the platform config directory.
    #[arg(long, global = true, env = "SETTINGS_ENGINE_CONFIG")]
    config: Option<PathBuf>,

    /// Schema document, overriding the config and the embedded schema.
    #[arg(long, global = true, env = "SETTINGS_ENGINE_SCHEMA")]
    schema: Option<PathBuf>,

    /// JSON settings store, overriding the config.
    #[arg(long, global = true, env = "SETTINGS_ENGINE_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Panel(PanelCommand),
    /// Write the effective config to the config file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Commands that run against the settings session.
#[derive(Debug, Subcommand)]
enum PanelCommand {
    /// Print saved values, draft, validation errors, and status.
    Show,
    /// Edit one setting and save it.
    Set {
        /// Storage key, e.g. `home.curatedRows`.
        key: String,
        /// New value, e.g. `5`, `true`, or `dark`.
        value: String,
    },
    /// Reset every setting to its default and save.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Check the persisted values against the schema.
    Validate,
}

fn print_result<T: Serialize>(result: &CommandResult<T>) -> anyhow::Result<ExitCode> {
    let json = serde_json::to_string_pretty(result).context("failed to encode result")?;
    println!("{json}");
    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Writes `config` to `path`, or to the platform config file when `None`.
fn init_config(
    config: &EngineConfig,
    path: Option<PathBuf>,
    force: bool,
) -> anyhow::Result<ExitCode> {
    let path = match path {
        Some(path) => path,
        None => config_file_path().context("no config path given")?,
    };
    if path.exists() && !force {
        return print_result(&CommandResult::<String>::err(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }
    save_config(config, &path).context("failed to write engine config")?;
    info!("wrote engine config to {}", path.display());
    print_result(&CommandResult::ok(path.display().to_string()))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("failed to load engine config")?;
    if let Some(schema) = cli.schema {
        config.schema.path = Some(schema);
    }
    if let Some(store) = cli.store {
        config.storage.store_path = Some(store);
    }

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.engine.log_level)),
        )
        .init();

    let command = match cli.command {
        Command::InitConfig { force } => return init_config(&config, cli.config, force),
        Command::Panel(command) => command,
    };

    let loader = SchemaLoader::from_optional_path(config.schema.path.clone());
    let state = match bootstrap(
        &config,
        &loader,
        MemorySurface::watchlist_panel(),
        Box::new(TracingSink),
    )
    .await
    {
        Ok(state) => state,
        Err(e) => return print_result(&unavailable::<()>(&e)),
    };

    match command {
        PanelCommand::Show => print_result(&get_settings(state).await),
        PanelCommand::Set { key, value } => {
            info!("setting {key} = {value}");
            let edited = edit_setting(Arc::clone(&state), key, value).await;
            if !edited.success {
                return print_result(&edited);
            }
            print_result(&save_settings(state).await)
        }
        PanelCommand::Reset { yes } => {
            let reset = if yes {
                reset_settings(Arc::clone(&state), FixedAnswer(true)).await
            } else {
                reset_settings(Arc::clone(&state), PromptConfirmation::terminal()).await
            };
            match &reset.data {
                Some(dto) if dto.applied => print_result(&save_settings(state).await),
                _ => print_result(&reset),
            }
        }
        PanelCommand::Validate => {
            let result = get_settings(state).await;
            let errors = result.data.map(|dto| dto.errors).unwrap_or_default();
            let validation = if errors.is_empty() {
                CommandResult::ok(errors)
            } else {
                let summary: Vec<String> = errors.iter().map(|(k, e)| format!("{k}: {e}")).collect();
                CommandResult::err(format!("invalid settings: {}", summary.join("; ")))
            };
            print_result(&validation)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
