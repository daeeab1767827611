//! Router-level failures.
//!
//! These never escape [`Session::exec`](crate::Session::exec): they become an
//! outcome with the reserved router status. A spawned process that exits
//! non-zero is not an error at all.

use std::path::PathBuf;

use aep_protocols::Scope;
use aep_protocols::error::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Environment for {scope} does not exist. Run `{hint}` first")]
    MissingEnvironment { scope: Scope, hint: String },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

impl ExecError {
    pub(crate) fn missing_environment(scope: Scope) -> Self {
        let hint = match &scope {
            Scope::Tools => "aep tool sync".to_string(),
            Scope::Skill(name) => format!("aep skill sync {}", name),
        };
        Self::MissingEnvironment { scope, hint }
    }

    pub(crate) fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}
