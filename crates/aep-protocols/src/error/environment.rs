//! Isolated environment errors.

use thiserror::Error;

use super::StorageError;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("Dependency install failed for scope '{scope}': {stderr}")]
    DependencyInstall { scope: String, stderr: String },

    #[error("Environment creation failed for scope '{scope}': {stderr}")]
    CreationFailed { scope: String, stderr: String },

    #[error("Installer '{program}' not found. {hint}")]
    InstallerNotFound { program: String, hint: String },

    #[error("Environment for scope '{0}' does not exist")]
    Missing(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_install_carries_stderr() {
        let err = EnvError::DependencyInstall {
            scope: "tools".to_string(),
            stderr: "No solution found when resolving dependencies".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("tools"));
        assert!(display.contains("No solution found"));
    }

    #[test]
    fn test_installer_not_found_hint() {
        let err = EnvError::InstallerNotFound {
            program: "uv".to_string(),
            hint: "Install it with: pip install uv".to_string(),
        };
        assert!(err.to_string().contains("pip install uv"));
    }
}
