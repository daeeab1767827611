//! Capability registries: copy sources into the store, set up environments,
//! and answer name lookups.

mod library;
mod skills;
mod tools;

pub use library::LibraryRegistry;
pub use skills::SkillRegistry;
pub use tools::{ToolRegistry, is_identifier};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use aep_config::StoreLayout;
use aep_protocols::CapabilityKind;
use aep_protocols::error::{IoResultExt, RegistryError, StorageError};
use walkdir::WalkDir;

/// One directory entry that is a capability.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub name: String,
    pub path: PathBuf,
    modified: SystemTime,
}

/// Capability entries of `dir` in registration order (mtime, then name).
///
/// `select` maps an entry path to its capability name, or rejects it.
pub(crate) fn list_entries<F>(dir: &Path, select: F) -> Result<Vec<Entry>, StorageError>
where
    F: Fn(&Path) -> Option<String>,
{
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(dir, e)),
    };

    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.at_path(dir)?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !StoreLayout::is_capability_entry(&file_name) {
            continue;
        }
        let path = entry.path();
        let Some(name) = select(&path) else {
            continue;
        };
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        entries.push(Entry {
            name,
            path,
            modified,
        });
    }

    entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

/// Reject names that cannot be a single path component inside the store.
pub(crate) fn check_entry_name(kind: CapabilityKind, name: &str) -> Result<(), RegistryError> {
    let reason = if name.is_empty() {
        Some("name cannot be empty")
    } else if name.contains(['/', '\\']) || name == ".." {
        Some("name cannot contain path separators")
    } else if !StoreLayout::is_capability_entry(name) {
        Some("name cannot start with '.' or '_'")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(RegistryError::InvalidName {
            kind,
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Recursively copy `source` into `dest`, skipping `.venv` directories and
/// in-flight staging areas.
pub(crate) fn copy_tree(source: &Path, dest: &Path) -> Result<(), StorageError> {
    let walker = WalkDir::new(source)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            e.depth() == 0 || (name != ".venv" && !name.starts_with(".staging-"))
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| source.to_path_buf());
            StorageError::io(path, std::io::Error::other(e.to_string()))
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| StorageError::corrupt(entry.path(), "outside of copy source"))?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).at_path(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).at_path(parent)?;
            }
            fs::copy(entry.path(), &target).at_path(&target)?;
        }
    }
    Ok(())
}

/// First non-empty line that is not a Markdown heading.
pub(crate) fn summary_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}
