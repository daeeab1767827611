//! [`EnvironmentPort`] backed by the `uv` installer.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::Stdio;

use aep_config::EnvironmentSettings;
use aep_protocols::environment::venv_bin_dir;
use aep_protocols::error::EnvError;
use aep_protocols::{Environment, EnvironmentPort};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

const INSTALL_HINT: &str =
    "Install it with: pip install uv, or see https://docs.astral.sh/uv/getting-started/installation/";

/// Creates virtualenvs with `uv venv` and installs with `uv pip install`.
#[derive(Debug, Clone)]
pub struct UvPort {
    program: String,
    python: Option<String>,
}

impl UvPort {
    pub fn new(program: impl Into<String>, python: Option<String>) -> Self {
        Self {
            program: program.into(),
            python,
        }
    }

    pub fn from_settings(settings: &EnvironmentSettings) -> Self {
        Self::new(settings.installer.clone(), settings.python.clone())
    }

    /// Fail early when the installer is not on `PATH`.
    pub fn check_installed(&self) -> Result<PathBuf, EnvError> {
        which::which(&self.program).map_err(|_| self.not_found())
    }

    fn not_found(&self) -> EnvError {
        EnvError::InstallerNotFound {
            program: self.program.clone(),
            hint: INSTALL_HINT.to_string(),
        }
    }

    async fn run(
        &self,
        env: &Environment,
        mut cmd: Command,
    ) -> Result<std::process::Output, EnvError> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                self.not_found()
            } else {
                EnvError::CreationFailed {
                    scope: env.scope.to_string(),
                    stderr: e.to_string(),
                }
            }
        })
    }
}

#[async_trait]
impl EnvironmentPort for UvPort {
    async fn create(&self, env: &Environment) -> Result<(), EnvError> {
        let mut cmd = Command::new(self.check_installed()?);
        cmd.arg("venv");
        if let Some(python) = &self.python {
            cmd.arg("--python").arg(python);
        }
        cmd.arg(&env.dir).current_dir(&env.work_dir);
        debug!("Running {} venv for {}", self.program, env.scope);

        let output = self.run(env, cmd).await?;
        if !output.status.success() {
            return Err(EnvError::CreationFailed {
                scope: env.scope.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    async fn install(&self, env: &Environment, requirements: &[String]) -> Result<(), EnvError> {
        if requirements.is_empty() {
            return Ok(());
        }
        let mut cmd = Command::new(self.check_installed()?);
        cmd.arg("pip")
            .arg("install")
            .args(requirements)
            .env("VIRTUAL_ENV", &env.dir)
            .current_dir(&env.work_dir);
        debug!("Running {} pip install {:?} for {}", self.program, requirements, env.scope);

        let output = self.run(env, cmd).await?;
        if !output.status.success() {
            return Err(EnvError::DependencyInstall {
                scope: env.scope.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn interpreter(&self, env: &Environment) -> PathBuf {
        let exe = if cfg!(target_os = "windows") {
            "python.exe"
        } else {
            "python"
        };
        venv_bin_dir(&env.dir).join(exe)
    }

    fn command_in(&self, env: &Environment, program: &OsStr) -> Command {
        let mut cmd = Command::new(program);
        cmd.env("VIRTUAL_ENV", &env.dir);
        if let Some(path) = prepend_path(venv_bin_dir(&env.dir)) {
            cmd.env("PATH", path);
        }
        cmd
    }
}

fn prepend_path(dir: PathBuf) -> Option<OsString> {
    let mut paths = vec![dir];
    if let Some(existing) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(paths).ok()
}
