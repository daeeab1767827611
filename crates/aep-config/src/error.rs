//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings{}: {source}", origin(.path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: toml::de::Error,
    },

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("Cannot determine home directory for default store location")]
    NoHomeDir,
}

fn origin(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_file() {
        let err = ConfigError::NotFound(PathBuf::from("/etc/aep.toml"));
        assert_eq!(err.to_string(), "Config file not found: /etc/aep.toml");
    }

    #[test]
    fn test_parse_error_origin() {
        let source = toml::from_str::<toml::Value>("x = [").unwrap_err();
        let err = ConfigError::Parse {
            path: Some(PathBuf::from("aep.toml")),
            source,
        };
        assert!(err.to_string().starts_with("Invalid settings in aep.toml: "));

        let source = toml::from_str::<toml::Value>("x = [").unwrap_err();
        let err = ConfigError::Parse { path: None, source };
        assert!(err.to_string().starts_with("Invalid settings: "));
    }

    #[test]
    fn test_env_var_not_set() {
        let err = ConfigError::EnvVarNotSet("FIGMA_API_KEY".to_string());
        assert!(err.to_string().contains("FIGMA_API_KEY"));
    }
}
