//! Isolated runtime environments and the port that manages them.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::EnvError;

/// The unit an isolated environment is created for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Scope {
    /// The one environment shared by every tool.
    Tools,
    /// A skill's private environment.
    Skill(String),
}

impl Scope {
    pub fn skill(name: impl Into<String>) -> Self {
        Scope::Skill(name.into())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Tools => f.write_str("tools"),
            Scope::Skill(name) => write!(f, "skill:{}", name),
        }
    }
}

/// A materialised environment backing one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub scope: Scope,
    /// Backing directory (the venv).
    pub dir: PathBuf,
    /// Directory installs and runs happen from.
    pub work_dir: PathBuf,
}

impl Environment {
    pub fn new(scope: Scope, dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            scope,
            dir: dir.into(),
            work_dir: work_dir.into(),
        }
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }
}

/// Port to the external environment/package tooling.
///
/// One implementation shells out to a real installer; tests use fakes.
#[async_trait]
pub trait EnvironmentPort: Send + Sync {
    /// Create the backing directory for `env`. Only called when absent.
    async fn create(&self, env: &Environment) -> Result<(), EnvError>;

    /// Install `requirements` into an existing environment.
    async fn install(&self, env: &Environment, requirements: &[String]) -> Result<(), EnvError>;

    /// Interpreter inside the environment.
    fn interpreter(&self, env: &Environment) -> PathBuf;

    /// Build a command that runs `program` inside the environment.
    fn command_in(&self, env: &Environment, program: &OsStr) -> Command;
}

/// Bin directory of a conventional virtualenv layout.
pub fn venv_bin_dir(venv: &Path) -> PathBuf {
    if cfg!(target_os = "windows") {
        venv.join("Scripts")
    } else {
        venv.join("bin")
    }
}
