//! Library: reference documents, no environment.

use std::fs;
use std::path::{Path, PathBuf};

use aep_config::StoreLayout;
use aep_protocols::error::{IoResultExt, RegistryError};
use aep_protocols::{CapabilityKind, CapabilityRecord};
use tracing::info;

use super::{check_entry_name, list_entries, summary_line};
use crate::index::{IndexLine, render_index};

const INDEX_FILE: &str = "index.md";

pub struct LibraryRegistry {
    layout: StoreLayout,
}

impl LibraryRegistry {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    /// Copy a document into the library. The name defaults to the file name.
    pub fn add(&self, source: &Path, name: Option<&str>) -> Result<PathBuf, RegistryError> {
        if !source.is_file() {
            return Err(RegistryError::InvalidSource(format!(
                "library source is not a file: {}",
                source.display()
            )));
        }
        let name = match name {
            Some(name) => name.to_string(),
            None => source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        check_entry_name(CapabilityKind::LibraryDoc, &name)?;
        if name == INDEX_FILE {
            return Err(RegistryError::InvalidName {
                kind: CapabilityKind::LibraryDoc,
                name,
                reason: "reserved for the generated index".to_string(),
            });
        }

        let dir = self.layout.library_dir();
        fs::create_dir_all(&dir).at_path(&dir)?;
        let target = self.layout.library_path(&name);
        fs::copy(source, &target).at_path(&target)?;
        info!("Added library document {} from {:?}", name, source);
        Ok(target)
    }

    pub fn list(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self.entries()?.into_iter().map(|e| e.name).collect())
    }

    fn entries(&self) -> Result<Vec<super::Entry>, RegistryError> {
        Ok(list_entries(&self.layout.library_dir(), |path| {
            let name = path.file_name()?.to_string_lossy().into_owned();
            (path.is_file() && name != INDEX_FILE).then_some(name)
        })?)
    }

    pub fn exists(&self, name: &str) -> bool {
        check_entry_name(CapabilityKind::LibraryDoc, name).is_ok()
            && name != INDEX_FILE
            && self.layout.library_path(name).is_file()
    }

    pub fn info(&self, name: &str) -> Result<Option<String>, RegistryError> {
        if !self.exists(name) {
            return Ok(None);
        }
        let path = self.layout.library_path(name);
        Ok(Some(fs::read_to_string(&path).at_path(&path)?))
    }

    /// Returns whether the document existed.
    pub fn remove(&self, name: &str) -> Result<bool, RegistryError> {
        if !self.exists(name) {
            return Ok(false);
        }
        let path = self.layout.library_path(name);
        fs::remove_file(&path).at_path(&path)?;
        info!("Removed library document {}", name);
        Ok(true)
    }

    pub fn records(&self) -> Result<Vec<CapabilityRecord>, RegistryError> {
        Ok(self
            .entries()?
            .into_iter()
            .map(|entry| CapabilityRecord::new(CapabilityKind::LibraryDoc, entry.name, entry.path))
            .collect())
    }

    /// Re-render `library/index.md`.
    pub fn generate_index(&self) -> Result<PathBuf, RegistryError> {
        let lines: Vec<IndexLine> = self
            .entries()?
            .into_iter()
            .map(|entry| {
                let description = fs::read_to_string(&entry.path)
                    .ok()
                    .and_then(|text| summary_line(&text))
                    .unwrap_or_else(|| "No description".to_string());
                IndexLine::new(format!("`{}`", entry.name), description)
            })
            .collect();

        let path = self.layout.library_index();
        let content = render_index("Library", "Reference documents:", &lines, None);
        fs::write(&path, content).at_path(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "library_tests.rs"]
mod tests;
