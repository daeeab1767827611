//! Shell passthrough for anything the router does not recognise.

use aep_protocols::ExecOutcome;
use tokio::process::Command;

use crate::error::ExecError;
use crate::executor::{ExecContext, capture};

fn shell() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

/// Run `line` verbatim in the session's cwd with its exported variables.
pub async fn run_shell(line: &str, ctx: ExecContext<'_>) -> Result<ExecOutcome, ExecError> {
    let (program, flag) = shell();
    let mut cmd = Command::new(program);
    cmd.arg(flag).arg(line).current_dir(ctx.cwd).envs(ctx.env);
    capture(cmd, program).await
}
