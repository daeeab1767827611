//! Dependency declaration files (`requirements.txt`).

use std::fs;
use std::path::{Path, PathBuf};

use aep_protocols::error::{IoResultExt, StorageError};

/// Ordered, de-duplicated requirement strings persisted for one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declaration {
    requirements: Vec<String>,
}

impl Declaration {
    /// Parse file content. Blank lines and `#` comments are ignored.
    pub fn parse(content: &str) -> Self {
        let mut declaration = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            declaration.push(line);
        }
        declaration
    }

    /// Load from disk; a missing file is an empty declaration.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    pub fn from_requirements<I, S>(requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut declaration = Self::default();
        declaration.extend(requirements);
        declaration
    }

    /// Append requirements, skipping exact duplicates. Returns the newly added ones.
    pub fn extend<I, S>(&mut self, requirements: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        requirements
            .into_iter()
            .filter_map(|r| {
                let r = r.as_ref().trim();
                if r.is_empty() || !self.push(r) {
                    None
                } else {
                    Some(r.to_string())
                }
            })
            .collect()
    }

    fn push(&mut self, requirement: &str) -> bool {
        if self.requirements.iter().any(|r| r == requirement) {
            return false;
        }
        self.requirements.push(requirement.to_string());
        true
    }

    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for r in &self.requirements {
            out.push_str(r);
            out.push('\n');
        }
        out
    }

    /// Write through a temporary file and rename into place.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        write_atomic(path, self.render().as_bytes())
    }
}

/// Raw declaration file state captured before a mutation.
#[derive(Debug, Clone)]
pub struct DeclarationSnapshot {
    path: PathBuf,
    content: Option<Vec<u8>>,
}

impl DeclarationSnapshot {
    pub fn capture(path: &Path) -> Result<Self, StorageError> {
        let content = match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(StorageError::io(path, e)),
        };
        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Put the file back exactly as captured (absent stays absent).
    pub fn restore(&self) -> Result<(), StorageError> {
        match &self.content {
            Some(bytes) => write_atomic(&self.path, bytes),
            None => match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StorageError::io(&self.path, e)),
            },
        }
    }
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).at_path(parent)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));
    fs::write(&tmp, bytes).at_path(&tmp)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(StorageError::io(path, e));
    }
    Ok(())
}
