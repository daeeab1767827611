//! Backends the router dispatches to.

mod skill;
mod tool;

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;

use aep_protocols::ExecOutcome;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ExecError;

pub use skill::SkillExecutor;
pub use tool::{TOOL_WRAPPER, ToolExecutor};

/// Session state a spawned process inherits.
#[derive(Debug, Clone, Copy)]
pub struct ExecContext<'a> {
    pub cwd: &'a Path,
    pub workspace: &'a Path,
    pub env: &'a BTreeMap<String, String>,
}

/// Run `cmd` to completion and capture both streams.
///
/// The child is killed if the returned future is dropped.
pub(crate) async fn capture(mut cmd: Command, program: &str) -> Result<ExecOutcome, ExecError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Spawning {}", program);
    let output = cmd
        .output()
        .await
        .map_err(|e| ExecError::spawn(program, e))?;

    let outcome = ExecOutcome::from_output(&output);
    if !outcome.is_success() {
        warn!(
            "{} exited with status {}: {}",
            program,
            outcome.status,
            outcome.stderr.lines().next().unwrap_or_default()
        );
    }
    Ok(outcome)
}
