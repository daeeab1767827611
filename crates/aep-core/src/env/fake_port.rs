use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Mutex;

use aep_protocols::error::EnvError;
use aep_protocols::{Environment, EnvironmentPort};
use async_trait::async_trait;
use tokio::process::Command;

/// Records calls instead of creating real virtualenvs.
#[derive(Default)]
pub(crate) struct FakePort {
    pub creates: Mutex<Vec<PathBuf>>,
    pub installs: Mutex<Vec<Vec<String>>>,
    pub fail_create: bool,
    /// Installs containing this requirement fail.
    pub fail_on: Option<String>,
}

impl FakePort {
    pub fn failing_on(requirement: &str) -> Self {
        Self {
            fail_on: Some(requirement.to_string()),
            ..Default::default()
        }
    }

    pub fn create_count(&self) -> usize {
        self.creates.lock().unwrap().len()
    }

    pub fn installs(&self) -> Vec<Vec<String>> {
        self.installs.lock().unwrap().clone()
    }
}

#[async_trait]
impl EnvironmentPort for FakePort {
    async fn create(&self, env: &Environment) -> Result<(), EnvError> {
        self.creates.lock().unwrap().push(env.dir.clone());
        std::fs::create_dir_all(env.dir.join("bin")).unwrap();
        if self.fail_create {
            return Err(EnvError::CreationFailed {
                scope: env.scope.to_string(),
                stderr: "no interpreter found".to_string(),
            });
        }
        Ok(())
    }

    async fn install(&self, env: &Environment, requirements: &[String]) -> Result<(), EnvError> {
        self.installs.lock().unwrap().push(requirements.to_vec());
        if let Some(bad) = &self.fail_on {
            if requirements.iter().any(|r| r == bad) {
                return Err(EnvError::DependencyInstall {
                    scope: env.scope.to_string(),
                    stderr: format!("No solution found when resolving: {}", bad),
                });
            }
        }
        Ok(())
    }

    fn interpreter(&self, env: &Environment) -> PathBuf {
        env.dir.join("bin").join("python")
    }

    fn command_in(&self, env: &Environment, program: &OsStr) -> Command {
        let mut cmd = Command::new(program);
        cmd.env("VIRTUAL_ENV", &env.dir);
        cmd
    }
}
