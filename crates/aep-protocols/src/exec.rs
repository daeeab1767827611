//! Outcome of a routed command.

use serde::{Deserialize, Serialize};

/// Captured result of one `exec` call.
///
/// Both streams default to empty and the status defaults to success, so an
/// outcome is never partially populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutcome {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl ExecOutcome {
    /// Usage or parse error inside the router.
    pub const USAGE_STATUS: i32 = 2;
    /// Router-level failure: unknown capability, missing environment, bad path.
    pub const ROUTER_FAILURE_STATUS: i32 = 127;

    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            status,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::failure(Self::USAGE_STATUS, message)
    }

    pub fn router_failure(message: impl Into<String>) -> Self {
        Self::failure(Self::ROUTER_FAILURE_STATUS, message)
    }

    pub fn from_output(output: &std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            // Killed by a signal: no exit code.
            status: output.status.code().unwrap_or(-1),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}
