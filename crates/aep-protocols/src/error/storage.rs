//! Storage errors.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    #[error("Corrupt record at {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
}

impl StorageError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn corrupt(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}

/// Attach a path to a bare `std::io::Error`.
pub trait IoResultExt<T> {
    fn at_path(self, path: impl AsRef<Path>) -> Result<T, StorageError>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn at_path(self, path: impl AsRef<Path>) -> Result<T, StorageError> {
        self.map_err(|e| StorageError::io(path, e))
    }
}
