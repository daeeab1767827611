//! Router commands: one-shot `exec` and the line-oriented `shell`.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use aep_config::Settings;
use aep_protocols::{ExecOutcome, Scope};
use aep_runtime::{CapabilityStore, Session};

pub(crate) fn resolve_workspace(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to read the current directory")?,
    };
    dir.canonicalize()
        .with_context(|| format!("workspace {} is not accessible", dir.display()))
}

/// Create the tools environment first when configured to and it is missing.
pub(crate) async fn prepare(store: &CapabilityStore, settings: &Settings) -> anyhow::Result<()> {
    if settings.environment.auto_init_tools && !store.manager().environment(&Scope::Tools).exists()
    {
        info!("Tools environment missing, initialising");
        store
            .init_tool_environment(&[], true)
            .await
            .context("failed to initialise the tools environment")?;
    }
    Ok(())
}

fn emit(outcome: &ExecOutcome) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(outcome.stdout.as_bytes())?;
    stdout.flush()?;
    let mut stderr = std::io::stderr().lock();
    stderr.write_all(outcome.stderr.as_bytes())?;
    Ok(())
}

fn exit_status(status: i32) -> u8 {
    u8::try_from(status).unwrap_or(1)
}

fn exit_code(status: i32) -> ExitCode {
    ExitCode::from(exit_status(status))
}

pub(crate) async fn exec_line(
    store: Arc<CapabilityStore>,
    workspace: PathBuf,
    line: &str,
) -> anyhow::Result<ExitCode> {
    let mut session = Session::new(store, workspace);
    let outcome = session.exec(line).await;
    emit(&outcome)?;
    Ok(exit_code(outcome.status))
}

/// Run stdin lines through one session; the exit code is the last command's.
pub(crate) async fn shell(
    store: Arc<CapabilityStore>,
    workspace: PathBuf,
) -> anyhow::Result<ExitCode> {
    let mut session = Session::new(store, workspace);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut status = 0;
    while let Some(line) = lines.next_line().await? {
        let outcome = session.exec(&line).await;
        emit(&outcome)?;
        status = outcome.status;
    }
    Ok(exit_code(status))
}
