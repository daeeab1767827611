//! One capability store: registries, environments and the remote adapter.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aep_config::{Settings, StoreLayout};
use aep_core::{LibraryRegistry, LifecycleManager, SkillRegistry, ToolRegistry, UvPort};
use aep_mcp_bridge::RemoteAdapter;
use aep_protocols::error::{EnvError, IoResultExt, RegistryError, StorageError};
use aep_protocols::{Environment, EnvironmentPort, Scope};
use tracing::{debug, info};

pub struct CapabilityStore {
    manager: LifecycleManager,
    tools: ToolRegistry,
    skills: SkillRegistry,
    library: LibraryRegistry,
    remote: RemoteAdapter,
    default_tool_dependencies: Vec<String>,
}

impl CapabilityStore {
    /// Open (creating if needed) the store at `root` with the `uv` port.
    pub fn open(root: impl Into<PathBuf>, settings: &Settings) -> Result<Self, StorageError> {
        let port = Arc::new(UvPort::from_settings(&settings.environment));
        Self::with_port(root, port, settings)
    }

    /// Open with an explicit environment port.
    pub fn with_port(
        root: impl Into<PathBuf>,
        port: Arc<dyn EnvironmentPort>,
        settings: &Settings,
    ) -> Result<Self, StorageError> {
        let layout = StoreLayout::new(root);
        layout.create_dirs().at_path(layout.root())?;
        debug!("Opened capability store at {:?}", layout.root());

        let manager = LifecycleManager::new(layout.clone(), port);
        Ok(Self {
            tools: ToolRegistry::new(manager.clone()),
            skills: SkillRegistry::new(manager.clone()),
            library: LibraryRegistry::new(layout),
            remote: RemoteAdapter::from_settings(manager.clone(), &settings.remote),
            manager,
            default_tool_dependencies: settings.environment.default_tool_dependencies.clone(),
        })
    }

    pub fn layout(&self) -> &StoreLayout {
        self.manager.layout()
    }

    pub fn root(&self) -> &Path {
        self.layout().root()
    }

    pub fn manager(&self) -> &LifecycleManager {
        &self.manager
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn skills(&self) -> &SkillRegistry {
        &self.skills
    }

    pub fn library(&self) -> &LibraryRegistry {
        &self.library
    }

    pub fn remote(&self) -> &RemoteAdapter {
        &self.remote
    }

    /// Prepare the shared tools environment.
    ///
    /// Declares the configured defaults (when `include_defaults`) plus `extra`,
    /// then syncs. With nothing to declare the environment is only ensured.
    pub async fn init_tool_environment(
        &self,
        extra: &[String],
        include_defaults: bool,
    ) -> Result<Environment, EnvError> {
        let defaults: &[String] = if include_defaults {
            &self.default_tool_dependencies
        } else {
            &[]
        };
        let mut requirements: Vec<String> = Vec::new();
        for req in defaults.iter().chain(extra) {
            let req = req.trim();
            if !req.is_empty() && !requirements.iter().any(|r| r == req) {
                requirements.push(req.to_string());
            }
        }

        if requirements.is_empty() {
            return self.manager.ensure(&Scope::Tools).await;
        }
        info!("Initialising tools environment with {:?}", requirements);
        self.manager
            .declare_and_sync(&Scope::Tools, &requirements)
            .await
    }

    /// Re-render the three index files.
    pub fn index(&self) -> Result<Vec<PathBuf>, RegistryError> {
        Ok(vec![
            self.tools.generate_index()?,
            self.skills.generate_index()?,
            self.library.generate_index()?,
        ])
    }

    /// The existing index files, concatenated.
    pub fn context(&self) -> String {
        let layout = self.layout();
        [
            layout.tools_index(),
            layout.skills_index(),
            layout.library_index(),
        ]
        .iter()
        .filter_map(|path| fs::read_to_string(path).ok())
        .collect::<Vec<_>>()
        .join("\n\n")
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
