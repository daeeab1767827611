//! On-disk layout of a capability store.

use std::path::{Path, PathBuf};

use aep_protocols::{Environment, Scope};

const TOOLS_DIR: &str = "tools";
const SKILLS_DIR: &str = "skills";
const LIBRARY_DIR: &str = "library";
const MCP_DIR: &str = "_mcp";
const VENV_DIR: &str = ".venv";
const REQUIREMENTS_FILE: &str = "requirements.txt";
const INDEX_FILE: &str = "index.md";
const MCP_CONFIG_FILE: &str = "config.json";

/// Paths inside a capability store rooted at one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the four kind directories.
    pub fn create_dirs(&self) -> std::io::Result<()> {
        for dir in [
            self.tools_dir(),
            self.skills_dir(),
            self.library_dir(),
            self.mcp_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn tools_dir(&self) -> PathBuf {
        self.root.join(TOOLS_DIR)
    }

    pub fn tool_path(&self, name: &str) -> PathBuf {
        self.tools_dir().join(format!("{}.py", name))
    }

    pub fn tool_doc_path(&self, name: &str) -> PathBuf {
        self.tools_dir().join(format!("{}.md", name))
    }

    pub fn tools_index(&self) -> PathBuf {
        self.tools_dir().join(INDEX_FILE)
    }

    pub fn skills_dir(&self) -> PathBuf {
        self.root.join(SKILLS_DIR)
    }

    pub fn skill_dir(&self, name: &str) -> PathBuf {
        self.skills_dir().join(name)
    }

    pub fn skills_index(&self) -> PathBuf {
        self.skills_dir().join(INDEX_FILE)
    }

    pub fn library_dir(&self) -> PathBuf {
        self.root.join(LIBRARY_DIR)
    }

    pub fn library_path(&self, name: &str) -> PathBuf {
        self.library_dir().join(name)
    }

    pub fn library_index(&self) -> PathBuf {
        self.library_dir().join(INDEX_FILE)
    }

    pub fn mcp_dir(&self) -> PathBuf {
        self.root.join(MCP_DIR)
    }

    pub fn mcp_config_path(&self, server: &str) -> PathBuf {
        self.mcp_dir().join(server).join(MCP_CONFIG_FILE)
    }

    /// Directory a scope's environment and declaration live in.
    pub fn scope_dir(&self, scope: &Scope) -> PathBuf {
        match scope {
            Scope::Tools => self.tools_dir(),
            Scope::Skill(name) => self.skill_dir(name),
        }
    }

    pub fn env_dir(&self, scope: &Scope) -> PathBuf {
        self.scope_dir(scope).join(VENV_DIR)
    }

    pub fn declaration_path(&self, scope: &Scope) -> PathBuf {
        self.scope_dir(scope).join(REQUIREMENTS_FILE)
    }

    pub fn environment(&self, scope: &Scope) -> Environment {
        Environment::new(scope.clone(), self.env_dir(scope), self.scope_dir(scope))
    }

    /// Whether a directory entry name can be a capability.
    ///
    /// Hidden and underscore-prefixed entries (environments, staging areas,
    /// `__pycache__`) never are.
    pub fn is_capability_entry(name: &str) -> bool {
        !(name.starts_with('.') || name.starts_with('_'))
    }
}
