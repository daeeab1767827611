//! AEP - Agent Environment Protocol
//!
//! Command-line entry point: store management, remote servers and the
//! command router.

mod cli;
mod cmd_capability;
mod cmd_exec;
mod cmd_mcp;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{debug, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use aep_config::{ConfigLoader, LoggingSettings, Settings, SettingsValidator};
use aep_runtime::CapabilityStore;

use cli::{Cli, Commands};

fn log_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".aep").join("logs"))
}

fn init_tracing(settings: &LoggingSettings) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    // stdout carries command output, logs go to stderr
    let console = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    let file = match log_dir().filter(|_| settings.file) {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("aep")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();

    Ok(())
}

fn check_settings(settings: &Settings) -> anyhow::Result<()> {
    let result = SettingsValidator::validate(settings);
    if !result.is_valid() {
        let errors: Vec<String> = result.errors.iter().map(ToString::to_string).collect();
        bail!("invalid configuration:\n  {}", errors.join("\n  "));
    }
    for warning in &result.warnings {
        warn!("Config {}", warning);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let settings = ConfigLoader::load_or_default(cli.config.as_deref())?;
    init_tracing(&settings.logging)?;
    check_settings(&settings)?;

    let root = ConfigLoader::resolve_store_root(&settings, cli.store.as_deref())?;
    debug!("Using store {}", root.display());
    let store = Arc::new(
        CapabilityStore::open(&root, &settings)
            .with_context(|| format!("failed to open store {}", root.display()))?,
    );

    match cli.command {
        Commands::Init { deps, no_defaults } => {
            cmd_capability::init(&store, &deps, !no_defaults).await?
        }
        Commands::Index => cmd_capability::index(&store)?,
        Commands::Tool { action } => cmd_capability::tool(&store, action).await?,
        Commands::Skill { action } => cmd_capability::skill(&store, action).await?,
        Commands::Library { action } => cmd_capability::library(&store, action)?,
        Commands::Mcp { action } => return cmd_mcp::run(&store, action).await,
        Commands::Exec { line, workspace } => {
            let workspace = cmd_exec::resolve_workspace(workspace.workspace)?;
            cmd_exec::prepare(&store, &settings).await?;
            return cmd_exec::exec_line(store, workspace, &line).await;
        }
        Commands::Shell { workspace } => {
            let workspace = cmd_exec::resolve_workspace(workspace.workspace)?;
            cmd_exec::prepare(&store, &settings).await?;
            return cmd_exec::shell(store, workspace).await;
        }
    }

    Ok(ExitCode::SUCCESS)
}
