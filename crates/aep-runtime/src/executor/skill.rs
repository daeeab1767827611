//! Runs a skill script inside that skill's private environment.

use std::ffi::OsStr;

use aep_core::{LifecycleManager, SkillRegistry};
use aep_protocols::{ExecOutcome, Scope};
use tracing::info;

use super::{ExecContext, capture};
use crate::error::ExecError;

pub struct SkillExecutor {
    manager: LifecycleManager,
    registry: SkillRegistry,
}

impl SkillExecutor {
    pub fn new(manager: LifecycleManager) -> Self {
        Self {
            registry: SkillRegistry::new(manager.clone()),
            manager,
        }
    }

    /// Run `<skill>/<script>` with `args`, from the skill directory.
    ///
    /// `.py` goes through the skill's interpreter, `.sh` through `sh`, and
    /// anything else is executed directly.
    pub async fn run(
        &self,
        path: &str,
        args: &[String],
        ctx: ExecContext<'_>,
    ) -> Result<ExecOutcome, ExecError> {
        let (skill, script) = self.registry.resolve_script(path)?;
        let scope = Scope::skill(&skill);
        let env = self.manager.environment(&scope);
        if !env.exists() {
            return Err(ExecError::missing_environment(scope));
        }

        let port = self.manager.port();
        let extension = script.extension().and_then(OsStr::to_str);
        let mut cmd = match extension {
            Some("py") => {
                let mut cmd = port.command_in(&env, port.interpreter(&env).as_os_str());
                cmd.arg(&script);
                cmd
            }
            Some("sh") => {
                let mut cmd = port.command_in(&env, OsStr::new("sh"));
                cmd.arg(&script);
                cmd
            }
            _ => port.command_in(&env, script.as_os_str()),
        };
        cmd.args(args)
            .current_dir(&env.work_dir)
            .envs(ctx.env);

        info!("Running skill script {}", path);
        capture(cmd, path).await
    }
}
