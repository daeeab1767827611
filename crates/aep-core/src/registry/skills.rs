//! Skills: bundles with an entry document and a private environment each.

use std::fs;
use std::path::{Component, Path, PathBuf};

use aep_config::StoreLayout;
use aep_protocols::error::{IoResultExt, RegistryError};
use aep_protocols::{CapabilityKind, CapabilityRecord, Scope};
use tracing::{debug, info, warn};

use super::{check_entry_name, copy_tree, list_entries};
use crate::LifecycleManager;
use crate::frontmatter::{SkillHeader, find_entry_document};
use crate::index::{IndexLine, render_index};
use crate::staging::StagedBundle;
use crate::validator;

/// Entry document name for skills added from a single file.
const SINGLE_DOCUMENT_NAME: &str = "SKILL.md";

pub struct SkillRegistry {
    manager: LifecycleManager,
}

impl SkillRegistry {
    pub fn new(manager: LifecycleManager) -> Self {
        Self { manager }
    }

    fn layout(&self) -> &StoreLayout {
        self.manager.layout()
    }

    /// Register a skill from a directory or a single `.md` entry document.
    ///
    /// The copy is validated and its environment prepared before it replaces
    /// anything; any failure leaves the store as it was. Caller-supplied
    /// `dependencies` take precedence over the header's list.
    pub async fn add(
        &self,
        source: &Path,
        name: Option<&str>,
        dependencies: Option<&[String]>,
    ) -> Result<PathBuf, RegistryError> {
        let skills_dir = self.layout().skills_dir();
        fs::create_dir_all(&skills_dir).at_path(&skills_dir)?;

        let (name, mut bundle) = if source.is_file() {
            self.stage_document(&skills_dir, source, name)?
        } else if source.is_dir() {
            self.stage_directory(&skills_dir, source, name)?
        } else {
            return Err(RegistryError::InvalidSource(format!(
                "skill source does not exist: {}",
                source.display()
            )));
        };

        let errors = validator::validate(bundle.staged_path());
        if !errors.is_empty() {
            warn!("Skill {} rejected: {}", name, errors.join("; "));
            return Err(RegistryError::Validation { name, errors });
        }

        let header = self.staged_header(bundle.staged_path())?;
        let requirements = match dependencies {
            Some(deps) if !deps.is_empty() => deps.to_vec(),
            _ => header.dependencies,
        };

        bundle.swap_in()?;
        if bundle.replaced_existing() {
            debug!("Replacing existing skill {}", name);
        }

        self.manager
            .declare_and_sync(&Scope::skill(&name), &requirements)
            .await?;

        let target = bundle.finish();
        info!("Added skill {} from {:?}", name, source);
        Ok(target)
    }

    fn stage_document(
        &self,
        skills_dir: &Path,
        source: &Path,
        name: Option<&str>,
    ) -> Result<(String, StagedBundle), RegistryError> {
        if !source.extension().is_some_and(|ext| ext == "md") {
            return Err(RegistryError::InvalidSource(format!(
                "single-document skills must be .md files: {}",
                source.display()
            )));
        }

        let content = fs::read_to_string(source).at_path(source)?;
        let header = SkillHeader::parse(&content).map_err(|e| {
            RegistryError::InvalidSource(format!("{}: {}", source.display(), e))
        })?;
        let Some(header_name) = header.name else {
            return Err(RegistryError::InvalidSource(format!(
                "{} has no 'name' in its header",
                source.display()
            )));
        };
        if let Some(requested) = name {
            if requested != header_name {
                return Err(RegistryError::NameConflict(format!(
                    "requested name '{}' does not match header name '{}'",
                    requested, header_name
                )));
            }
        }
        check_entry_name(CapabilityKind::Skill, &header_name)?;

        let bundle = StagedBundle::new(skills_dir, &header_name)?;
        let staged = bundle.staged_path();
        fs::create_dir_all(staged).at_path(staged)?;
        let entry = staged.join(SINGLE_DOCUMENT_NAME);
        fs::write(&entry, content).at_path(&entry)?;
        Ok((header_name, bundle))
    }

    fn stage_directory(
        &self,
        skills_dir: &Path,
        source: &Path,
        name: Option<&str>,
    ) -> Result<(String, StagedBundle), RegistryError> {
        let canonical = source.canonicalize().at_path(source)?;
        let store = skills_dir.canonicalize().at_path(skills_dir)?;
        if store.starts_with(&canonical) {
            return Err(RegistryError::InvalidSource(format!(
                "skill source {} contains the skills directory",
                source.display()
            )));
        }
        let name = match name {
            Some(name) => name.to_string(),
            None => canonical
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        check_entry_name(CapabilityKind::Skill, &name)?;

        let bundle = StagedBundle::new(skills_dir, &name)?;
        copy_tree(source, bundle.staged_path())?;
        Ok((name, bundle))
    }

    fn staged_header(&self, dir: &Path) -> Result<SkillHeader, RegistryError> {
        let Some(entry) = find_entry_document(dir) else {
            return Ok(SkillHeader::default());
        };
        let content = fs::read_to_string(&entry).at_path(&entry)?;
        Ok(SkillHeader::parse(&content).unwrap_or_default())
    }

    /// Append dependencies to a skill's declaration and install them.
    pub async fn add_dependencies(
        &self,
        name: &str,
        packages: &[String],
    ) -> Result<PathBuf, RegistryError> {
        self.require(name)?;
        let scope = Scope::skill(name);
        self.manager.declare_and_sync(&scope, packages).await?;
        Ok(self.layout().declaration_path(&scope))
    }

    /// Install a skill's full declaration.
    pub async fn sync_dependencies(&self, name: &str) -> Result<(), RegistryError> {
        self.require(name)?;
        self.manager.sync(&Scope::skill(name)).await?;
        Ok(())
    }

    pub fn dependencies(&self, name: &str) -> Result<Vec<String>, RegistryError> {
        self.require(name)?;
        Ok(self.manager.read_declaration(&Scope::skill(name))?)
    }

    fn require(&self, name: &str) -> Result<PathBuf, RegistryError> {
        if self.exists(name) {
            Ok(self.layout().skill_dir(name))
        } else {
            Err(RegistryError::unknown(CapabilityKind::Skill, name))
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        check_entry_name(CapabilityKind::Skill, name).is_ok()
            && self.layout().skill_dir(name).is_dir()
    }

    pub fn list(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self.entries()?.into_iter().map(|e| e.name).collect())
    }

    fn entries(&self) -> Result<Vec<super::Entry>, RegistryError> {
        Ok(list_entries(&self.layout().skills_dir(), |path| {
            if path.is_dir() {
                path.file_name().map(|n| n.to_string_lossy().into_owned())
            } else {
                None
            }
        })?)
    }

    /// The skill's entry document (or README) content.
    pub fn info(&self, name: &str) -> Result<Option<String>, RegistryError> {
        if !self.exists(name) {
            return Ok(None);
        }
        let dir = self.layout().skill_dir(name);
        let doc = find_entry_document(&dir).or_else(|| {
            let readme = dir.join("README.md");
            readme.is_file().then_some(readme)
        });
        match doc {
            Some(path) => Ok(Some(fs::read_to_string(&path).at_path(&path)?)),
            None => Ok(Some(format!("Skill '{}' exists, no documentation", name))),
        }
    }

    /// Delete a skill and its private environment. Returns whether it existed.
    pub fn remove(&self, name: &str) -> Result<bool, RegistryError> {
        if !self.exists(name) {
            return Ok(false);
        }
        self.manager.discard(&Scope::skill(name))?;
        let dir = self.layout().skill_dir(name);
        fs::remove_dir_all(&dir).at_path(&dir)?;
        info!("Removed skill {}", name);
        Ok(true)
    }

    /// Resolve `<skill>/<relative script path>` to a script inside that skill.
    ///
    /// Anything that does not name an existing file inside an existing skill
    /// (including paths escaping the skill directory) is an unknown skill.
    pub fn resolve_script(&self, path: &str) -> Result<(String, PathBuf), RegistryError> {
        let unknown = || RegistryError::unknown(CapabilityKind::Skill, path);

        let relative = Path::new(path);
        let mut components = relative.components();
        let skill = match components.next() {
            Some(Component::Normal(first)) => first.to_string_lossy().into_owned(),
            _ => return Err(unknown()),
        };
        if !self.exists(&skill) {
            return Err(unknown());
        }

        let skill_dir = self
            .layout()
            .skill_dir(&skill)
            .canonicalize()
            .map_err(|_| unknown())?;
        let script = self
            .layout()
            .skills_dir()
            .join(relative)
            .canonicalize()
            .map_err(|_| unknown())?;
        if script == skill_dir || !script.starts_with(&skill_dir) || !script.is_file() {
            return Err(unknown());
        }
        Ok((skill, script))
    }

    pub fn records(&self) -> Result<Vec<CapabilityRecord>, RegistryError> {
        self.entries()?
            .into_iter()
            .map(|entry| -> Result<CapabilityRecord, RegistryError> {
                let dependencies = self.manager.read_declaration(&Scope::skill(&entry.name))?;
                Ok(CapabilityRecord::new(CapabilityKind::Skill, &entry.name, &entry.path)
                    .with_dependencies(dependencies))
            })
            .collect()
    }

    /// Re-render `skills/index.md`.
    pub fn generate_index(&self) -> Result<PathBuf, RegistryError> {
        let mut lines = Vec::new();
        for entry in self.entries()? {
            let description = find_entry_document(&entry.path)
                .and_then(|doc| fs::read_to_string(doc).ok())
                .and_then(|content| SkillHeader::parse(&content).ok())
                .and_then(|header| header.description)
                .unwrap_or_else(|| "No description".to_string());
            lines.push(IndexLine::new(
                format!("`{}` (`{}/`)", entry.name, entry.name),
                description,
            ));
        }

        let path = self.layout().skills_index();
        let content = render_index(
            "Skills",
            "Available skills:",
            &lines,
            Some("Run a script with `skills run <name>/<script> [args]`."),
        );
        fs::write(&path, content).at_path(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "skills_tests.rs"]
mod tests;
