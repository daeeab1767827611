use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Mutex;

use aep_protocols::error::EnvError;
use aep_protocols::{Environment, EnvironmentPort};
use async_trait::async_trait;
use tokio::process::Command;

/// Stand-in interpreter: reports what it was asked to run.
const FAKE_PYTHON: &str = r#"#!/bin/sh
if [ "$1" = "-c" ]; then
  printf 'code=%s tools=%s cwd=%s\n' "$3" "$AEP_TOOLS_DIR" "$AEP_CWD"
else
  script="$1"
  shift
  printf 'script=%s args=%s venv=%s\n' "$(basename "$script")" "$*" "$VIRTUAL_ENV"
fi
"#;

/// Creates environments holding a fake `bin/python` and records installs.
#[derive(Default)]
pub(crate) struct FakePort {
    pub creates: Mutex<Vec<PathBuf>>,
    pub installs: Mutex<Vec<Vec<String>>>,
}

impl FakePort {
    pub fn create_count(&self) -> usize {
        self.creates.lock().unwrap().len()
    }
}

#[async_trait]
impl EnvironmentPort for FakePort {
    async fn create(&self, env: &Environment) -> Result<(), EnvError> {
        self.creates.lock().unwrap().push(env.dir.clone());
        let bin = env.dir.join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let python = bin.join("python");
        std::fs::write(&python, FAKE_PYTHON).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&python, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        Ok(())
    }

    async fn install(&self, _env: &Environment, requirements: &[String]) -> Result<(), EnvError> {
        self.installs.lock().unwrap().push(requirements.to_vec());
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
