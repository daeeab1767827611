//! Tools: flat namespace of Python modules sharing one environment.

use std::fs;
use std::path::{Path, PathBuf};

use aep_config::StoreLayout;
use aep_protocols::error::{IoResultExt, RegistryError};
use aep_protocols::{CapabilityKind, CapabilityRecord, RemoteOrigin, Scope};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use super::{list_entries, summary_line};
use crate::LifecycleManager;
use crate::index::{IndexLine, render_index};
use crate::staging::StagedBundle;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Whether `name` can be used as a Python attribute (`tools.<name>`).
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name) && !PYTHON_KEYWORDS.contains(&name)
}

pub struct ToolRegistry {
    manager: LifecycleManager,
}

impl ToolRegistry {
    pub fn new(manager: LifecycleManager) -> Self {
        Self { manager }
    }

    fn layout(&self) -> &StoreLayout {
        self.manager.layout()
    }

    /// Copy a tool module into the store and prepare the shared environment.
    ///
    /// An existing tool of the same name is overwritten, but only once the
    /// environment step succeeded.
    pub async fn add(
        &self,
        source: &Path,
        name: Option<&str>,
        dependencies: &[String],
    ) -> Result<PathBuf, RegistryError> {
        if !source.is_file() {
            return Err(RegistryError::InvalidSource(format!(
                "tool source is not a file: {}",
                source.display()
            )));
        }

        let name = match name {
            Some(name) => name.to_string(),
            None => source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        if !is_identifier(&name) {
            return Err(RegistryError::InvalidName {
                kind: CapabilityKind::Tool,
                name,
                reason: "must be a Python identifier".to_string(),
            });
        }

        let tools_dir = self.layout().tools_dir();
        fs::create_dir_all(&tools_dir).at_path(&tools_dir)?;

        let mut bundle = StagedBundle::new(&tools_dir, &format!("{}.py", name))?;
        fs::copy(source, bundle.staged_path()).at_path(bundle.staged_path())?;
        bundle.swap_in()?;

        self.manager
            .declare_and_sync(&Scope::Tools, dependencies)
            .await?;

        let target = bundle.finish();
        info!("Added tool {} from {:?}", name, source);
        Ok(target)
    }

    /// Declare extra dependencies for the shared environment and install them.
    pub async fn add_dependencies(&self, packages: &[String]) -> Result<PathBuf, RegistryError> {
        self.manager.declare_and_sync(&Scope::Tools, packages).await?;
        info!("Added tools dependencies {:?}", packages);
        Ok(self.layout().declaration_path(&Scope::Tools))
    }

    /// Install the whole current declaration.
    pub async fn sync_dependencies(&self) -> Result<(), RegistryError> {
        self.manager.sync(&Scope::Tools).await?;
        Ok(())
    }

    pub fn dependencies(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self.manager.read_declaration(&Scope::Tools)?)
    }

    pub fn list(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self.entries()?.into_iter().map(|e| e.name).collect())
    }

    fn entries(&self) -> Result<Vec<super::Entry>, RegistryError> {
        Ok(list_entries(&self.layout().tools_dir(), |path| {
            if path.is_file() && path.extension().is_some_and(|ext| ext == "py") {
                path.file_stem().map(|s| s.to_string_lossy().into_owned())
            } else {
                None
            }
        })?)
    }

    pub fn exists(&self, name: &str) -> bool {
        is_identifier(name) && self.layout().tool_path(name).is_file()
    }

    /// Documentation for a tool: its `.md` file, else the module docstring.
    pub fn info(&self, name: &str) -> Result<Option<String>, RegistryError> {
        if !self.exists(name) {
            return Ok(None);
        }
        let doc_path = self.layout().tool_doc_path(name);
        if doc_path.is_file() {
            return Ok(Some(fs::read_to_string(&doc_path).at_path(&doc_path)?));
        }
        let path = self.layout().tool_path(name);
        let source = fs::read_to_string(&path).at_path(&path)?;
        Ok(Some(module_docstring(&source).unwrap_or_else(|| {
            format!("Tool '{}' exists, no documentation", name)
        })))
    }

    /// Delete a tool module and its documentation. Returns whether it existed.
    pub fn remove(&self, name: &str) -> Result<bool, RegistryError> {
        if !self.exists(name) {
            return Ok(false);
        }
        let path = self.layout().tool_path(name);
        fs::remove_file(&path).at_path(&path)?;
        let doc_path = self.layout().tool_doc_path(name);
        if doc_path.is_file() {
            fs::remove_file(&doc_path).at_path(&doc_path)?;
        }
        info!("Removed tool {}", name);
        Ok(true)
    }

    fn remote_origin(&self, name: &str) -> Option<RemoteOrigin> {
        let path = self.layout().mcp_config_path(name);
        let content = fs::read_to_string(&path).ok()?;
        let value: serde_json::Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                warn!("Skipping unreadable remote config {:?}: {}", path, e);
                return None;
            }
        };
        Some(RemoteOrigin {
            server: name.to_string(),
            transport: value
                .get("transport")
                .and_then(|t| t.as_str())
                .unwrap_or("unknown")
                .to_string(),
        })
    }

    pub fn records(&self) -> Result<Vec<CapabilityRecord>, RegistryError> {
        let dependencies = self.dependencies()?;
        Ok(self
            .entries()?
            .into_iter()
            .map(|entry| {
                let record = CapabilityRecord::new(CapabilityKind::Tool, &entry.name, &entry.path)
                    .with_dependencies(dependencies.clone());
                match self.remote_origin(&entry.name) {
                    Some(origin) => record.with_remote_origin(origin),
                    None => record,
                }
            })
            .collect())
    }

    /// Re-render `tools/index.md`.
    pub fn generate_index(&self) -> Result<PathBuf, RegistryError> {
        let mut lines = Vec::new();
        for entry in self.entries()? {
            let remote = self.layout().mcp_config_path(&entry.name).is_file();
            let description = self.describe(&entry.name, &entry.path);
            let label = if remote {
                format!("`{}` (MCP)", entry.name)
            } else {
                format!("`{}`", entry.name)
            };
            lines.push(IndexLine::new(
                label,
                format!(
                    "{}. Use `tools run \"tools.{}.<func>(...)\"`",
                    description.trim_end_matches('.'),
                    entry.name
                ),
            ));
        }

        let path = self.layout().tools_index();
        let content = render_index("Tools", "Available tools:", &lines, None);
        fs::write(&path, content).at_path(&path)?;
        Ok(path)
    }

    fn describe(&self, name: &str, module: &Path) -> String {
        let doc_path = self.layout().tool_doc_path(name);
        let from_doc = fs::read_to_string(&doc_path)
            .ok()
            .and_then(|doc| summary_line(&doc));
        from_doc
            .or_else(|| {
                fs::read_to_string(module)
                    .ok()
                    .and_then(|source| module_docstring(&source))
                    .and_then(|doc| summary_line(&doc))
            })
            .unwrap_or_else(|| "No description".to_string())
    }
}

/// The leading string literal of a Python module, if any.
pub(crate) fn module_docstring(source: &str) -> Option<String> {
    let mut rest = source.trim_start_matches('\u{feff}');
    loop {
        let trimmed = rest.trim_start();
        if trimmed.starts_with('#') {
            rest = trimmed.split_once('\n').map(|(_, r)| r).unwrap_or("");
            continue;
        }
        rest = trimmed;
        break;
    }

    let rest = rest
        .strip_prefix(['r', 'R', 'u', 'U'])
        .filter(|r| r.starts_with(['"', '\'']))
        .unwrap_or(rest);

    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(body) = rest.strip_prefix(quote) {
            let end = body.find(quote)?;
            let doc = body[..end].trim();
            return if doc.is_empty() {
                None
            } else {
                Some(doc.to_string())
            };
        }
    }
    None
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
