//! Agent session: one command at a time against a capability store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aep_protocols::error::RegistryError;
use aep_protocols::{CapabilityKind, ExecOutcome};
use tracing::{debug, warn};

use crate::command::Command;
use crate::error::ExecError;
use crate::executor::{ExecContext, SkillExecutor, ToolExecutor};
use crate::shell::run_shell;
use crate::store::CapabilityStore;

/// Session-local working directory and exported variables over a store.
///
/// [`Session::exec`] takes `&mut self`, so commands in one session always
/// run strictly one after another.
pub struct Session {
    store: Arc<CapabilityStore>,
    workspace: PathBuf,
    cwd: PathBuf,
    env: BTreeMap<String, String>,
    tools: ToolExecutor,
    skills: SkillExecutor,
}

impl Session {
    pub fn new(store: Arc<CapabilityStore>, workspace: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        let manager = store.manager().clone();
        Self {
            tools: ToolExecutor::new(manager.clone()),
            skills: SkillExecutor::new(manager),
            store,
            cwd: workspace.clone(),
            workspace,
            env: BTreeMap::new(),
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Variables set with `export`.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Index files of the store, for the agent's system prompt.
    pub fn context(&self) -> String {
        self.store.context()
    }

    /// Run one line of input.
    ///
    /// Never fails: parse errors, unknown capabilities and other router
    /// problems come back as reserved statuses, and a failing child process
    /// as its own status.
    pub async fn exec(&mut self, line: &str) -> ExecOutcome {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => return ExecOutcome::usage(e.to_string()),
        };
        debug!("exec: {:?}", command);

        match self.dispatch(command).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Command failed in router: {}", e);
                ExecOutcome::router_failure(e.to_string())
            }
        }
    }

    async fn dispatch(&mut self, command: Command) -> Result<ExecOutcome, ExecError> {
        match command {
            Command::Empty => Ok(ExecOutcome::default()),
            Command::ToolsList => Ok(names(self.store.tools().list()?)),
            Command::ToolsInfo(name) => {
                let info = self.store.tools().info(&name)?;
                documented(info, CapabilityKind::Tool, name)
            }
            Command::ToolsRun(code) => self.tools.run(&code, self.context_for_child()).await,
            Command::SkillsList => Ok(names(self.store.skills().list()?)),
            Command::SkillsInfo(name) => {
                let info = self.store.skills().info(&name)?;
                documented(info, CapabilityKind::Skill, name)
            }
            Command::SkillsRun { path, args } => {
                self.skills
                    .run(&path, &args, self.context_for_child())
                    .await
            }
            Command::Cd(target) => self.cd(target.as_deref()),
            Command::Export(pairs) => Ok(self.export(pairs)),
            Command::Shell(line) => run_shell(&line, self.context_for_child()).await,
        }
    }

    fn context_for_child(&self) -> ExecContext<'_> {
        ExecContext {
            cwd: &self.cwd,
            workspace: &self.workspace,
            env: &self.env,
        }
    }

    fn cd(&mut self, target: Option<&str>) -> Result<ExecOutcome, ExecError> {
        let next = match target {
            None => self.workspace.clone(),
            Some(target) => {
                let path = Path::new(target);
                let joined = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    self.cwd.join(path)
                };
                let resolved = joined
                    .canonicalize()
                    .map_err(|_| ExecError::NotADirectory(joined.clone()))?;
                if !resolved.is_dir() {
                    return Err(ExecError::NotADirectory(resolved));
                }
                resolved
            }
        };
        self.cwd = next;
        Ok(ExecOutcome::stdout(format!("{}\n", self.cwd.display())))
    }

    fn export(&mut self, pairs: Vec<(String, String)>) -> ExecOutcome {
        if pairs.is_empty() {
            let listing: String = self
                .env
                .iter()
                .map(|(k, v)| format!("{}={}\n", k, v))
                .collect();
            return ExecOutcome::stdout(listing);
        }
        self.env.extend(pairs);
        ExecOutcome::default()
    }
}

fn names(names: Vec<String>) -> ExecOutcome {
    let mut stdout = names.join("\n");
    if !stdout.is_empty() {
        stdout.push('\n');
    }
    ExecOutcome::stdout(stdout)
}

fn documented(
    info: Option<String>,
    kind: CapabilityKind,
    name: String,
) -> Result<ExecOutcome, ExecError> {
    info.map(ExecOutcome::stdout)
        .ok_or_else(|| RegistryError::unknown(kind, name).into())
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
