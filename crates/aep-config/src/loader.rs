//! Settings loader.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Settings;

/// Settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "aep.toml";

/// Environment variable that overrides the store root.
pub const STORE_ENV_VAR: &str = "AEP_STORE";

static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// Settings loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, Some(path))
    }

    /// Load settings from a string.
    pub fn load_str(content: &str) -> Result<Settings, ConfigError> {
        Self::parse(content, None)
    }

    fn parse(content: &str, path: Option<&Path>) -> Result<Settings, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        toml::from_str(&expanded).map_err(|source| ConfigError::Parse {
            path: path.map(Path::to_path_buf),
            source,
        })
    }

    /// Load an explicit file, or `aep.toml` in the working directory when present.
    ///
    /// A missing default file yields default settings; a missing explicit file is an error.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Settings::default()),
        }
    }

    /// `aep.toml` in the working directory.
    pub fn default_path() -> Option<PathBuf> {
        std::env::current_dir().ok().map(|cwd| cwd.join(DEFAULT_CONFIG_FILE))
    }

    /// Resolve the store root.
    ///
    /// Precedence: explicit override, `AEP_STORE`, `[store] root`, then `~/.aep/store`.
    pub fn resolve_store_root(
        settings: &Settings,
        explicit: Option<&Path>,
    ) -> Result<PathBuf, ConfigError> {
        if let Some(path) = explicit {
            return Ok(Self::expand_path_buf(path));
        }
        if let Ok(value) = std::env::var(STORE_ENV_VAR) {
            if !value.trim().is_empty() {
                return Ok(PathBuf::from(Self::expand_path(&value)));
            }
        }
        if let Some(root) = &settings.store.root {
            return Ok(Self::expand_path_buf(root));
        }
        dirs::home_dir()
            .map(|home| home.join(".aep").join("store"))
            .ok_or(ConfigError::NoHomeDir)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();

        for cap in ENV_VAR_PATTERN.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.aep`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }

    fn expand_path_buf(path: &Path) -> PathBuf {
        match path.to_str() {
            Some(s) => PathBuf::from(Self::expand_path(s)),
            None => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let settings = ConfigLoader::load_str("").unwrap();
        assert_eq!(settings.environment.installer, "uv");
        assert_eq!(settings.remote.request_timeout_seconds, 30);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            [store]
            root = "/srv/aep"

            [environment]
            installer = "uv"
            python = "3.11"
            default_tool_dependencies = ["requests"]
            auto_init_tools = true

            [remote]
            request_timeout_seconds = 90
            invoker = "/usr/local/bin/aep"

            [logging]
            level = "debug"
            file = false
        "#;
        let settings = ConfigLoader::load_str(content).unwrap();
        assert_eq!(settings.store.root, Some(PathBuf::from("/srv/aep")));
        assert_eq!(settings.environment.python.as_deref(), Some("3.11"));
        assert_eq!(settings.environment.default_tool_dependencies, vec!["requests"]);
        assert!(settings.environment.auto_init_tools);
        assert_eq!(settings.remote.request_timeout_seconds, 90);
        assert_eq!(settings.remote.protocol_version, "2024-11-05");
        assert_eq!(
            settings.remote.invoker,
            Some(PathBuf::from("/usr/local/bin/aep"))
        );
        assert_eq!(settings.logging.level, "debug");
        assert!(!settings.logging.file);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[remote]").unwrap();
        writeln!(file, "request_timeout_seconds = 5").unwrap();

        let settings = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(settings.remote.request_timeout_seconds, 5);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/aep.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_explicit_missing() {
        let result = ConfigLoader::load_or_default(Some(Path::new("/nonexistent/aep.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::Parse { path: None, .. })));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("AEP_TEST_CONFIG_VAR", "test_value");
        }
        let content = "value = \"${AEP_TEST_CONFIG_VAR}\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert!(expanded.contains("test_value"));
        unsafe {
            std::env::remove_var("AEP_TEST_CONFIG_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${AEP_NONEXISTENT_TEST_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/test");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/test"));
    }

    #[test]
    fn test_resolve_store_root_explicit_wins() {
        let mut settings = Settings::default();
        settings.store.root = Some(PathBuf::from("/from/settings"));
        let root =
            ConfigLoader::resolve_store_root(&settings, Some(Path::new("/from/flag"))).unwrap();
        assert_eq!(root, PathBuf::from("/from/flag"));
    }
}
