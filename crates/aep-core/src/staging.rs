//! Rollback guard for a freshly copied capability.
//!
//! A bundle is copied into `<kind_dir>/.staging-<uuid>/<name>`, checked there,
//! then swapped into `<kind_dir>/<name>`. Until [`StagedBundle::finish`] is
//! called, dropping the guard undoes everything: the committed copy is
//! removed, any previous capability of the same name is put back, and the
//! staging area is deleted.

use std::fs;
use std::path::{Path, PathBuf};

use aep_protocols::error::{IoResultExt, StorageError};
use tracing::{debug, warn};

const BACKUP_NAME: &str = ".previous";

#[derive(Debug)]
pub struct StagedBundle {
    staging_root: PathBuf,
    staged: PathBuf,
    target: PathBuf,
    backup: Option<PathBuf>,
    swapped: bool,
    finished: bool,
}

impl StagedBundle {
    /// Reserve a staging area for the entry `file_name` inside `kind_dir`.
    pub fn new(kind_dir: &Path, file_name: &str) -> Result<Self, StorageError> {
        let staging_root = kind_dir.join(format!(".staging-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&staging_root).at_path(&staging_root)?;
        Ok(Self {
            staged: staging_root.join(file_name),
            target: kind_dir.join(file_name),
            staging_root,
            backup: None,
            swapped: false,
            finished: false,
        })
    }

    /// Where the new copy must be written.
    pub fn staged_path(&self) -> &Path {
        &self.staged
    }

    /// Whether the swap replaced an existing capability.
    pub fn replaced_existing(&self) -> bool {
        self.backup.is_some()
    }

    /// Move the staged copy to its final location, setting any existing entry aside.
    pub fn swap_in(&mut self) -> Result<&Path, StorageError> {
        if self.target.exists() {
            let backup = self.staging_root.join(BACKUP_NAME);
            fs::rename(&self.target, &backup).at_path(&self.target)?;
            self.backup = Some(backup);
        }
        if let Err(e) = fs::rename(&self.staged, &self.target) {
            if let Some(backup) = self.backup.take() {
                let _ = fs::rename(&backup, &self.target);
            }
            return Err(StorageError::io(&self.target, e));
        }
        self.swapped = true;
        debug!("Swapped {:?} into place", self.target);
        Ok(&self.target)
    }

    /// Keep the committed copy and drop the previous one.
    pub fn finish(mut self) -> PathBuf {
        self.finished = true;
        if let Err(e) = fs::remove_dir_all(&self.staging_root) {
            warn!("Could not remove staging area {:?}: {}", self.staging_root, e);
        }
        self.target.clone()
    }

    fn rollback(&mut self) {
        if self.swapped {
            if let Err(e) = remove_path(&self.target) {
                warn!("Rollback could not remove {:?}: {}", self.target, e);
            }
            if let Some(backup) = self.backup.take() {
                if let Err(e) = fs::rename(&backup, &self.target) {
                    warn!("Rollback could not restore {:?}: {}", self.target, e);
                }
            }
        }
        if let Err(e) = remove_path(&self.staging_root) {
            warn!("Rollback could not remove {:?}: {}", self.staging_root, e);
        }
        debug!("Rolled back staged {:?}", self.target);
    }
}

impl Drop for StagedBundle {
    fn drop(&mut self) {
        if !self.finished {
            self.rollback();
        }
    }
}

/// Remove a file or directory tree; absent is fine.
pub(crate) fn remove_path(path: &Path) -> std::io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn staging_dirs(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .starts_with(".staging-")
            })
            .count()
    }

    #[test]
    fn test_drop_before_swap_leaves_nothing() {
        let temp = TempDir::new().unwrap();
        {
            let bundle = StagedBundle::new(temp.path(), "demo").unwrap();
            fs::create_dir_all(bundle.staged_path()).unwrap();
        }
        assert!(!temp.path().join("demo").exists());
        assert_eq!(staging_dirs(temp.path()), 0);
    }

    #[test]
    fn test_drop_after_swap_restores_previous() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("grep.py");
        fs::write(&target, "old").unwrap();
        {
            let mut bundle = StagedBundle::new(temp.path(), "grep.py").unwrap();
            fs::write(bundle.staged_path(), "new").unwrap();
            bundle.swap_in().unwrap();
            assert!(bundle.replaced_existing());
            assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        }
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
        assert_eq!(staging_dirs(temp.path()), 0);
    }

    #[test]
    fn test_drop_after_swap_without_previous_removes_target() {
        let temp = TempDir::new().unwrap();
        {
            let mut bundle = StagedBundle::new(temp.path(), "demo").unwrap();
            fs::create_dir_all(bundle.staged_path().join("scripts")).unwrap();
            bundle.swap_in().unwrap();
        }
        assert!(!temp.path().join("demo").exists());
    }

    #[test]
    fn test_finish_commits() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("demo");
        fs::create_dir_all(target.join("old")).unwrap();

        let mut bundle = StagedBundle::new(temp.path(), "demo").unwrap();
        fs::create_dir_all(bundle.staged_path().join("new")).unwrap();
        bundle.swap_in().unwrap();
        let committed = bundle.finish();

        assert_eq!(committed, target);
        assert!(target.join("new").exists());
        assert!(!target.join("old").exists());
        assert_eq!(staging_dirs(temp.path()), 0);
    }
}
