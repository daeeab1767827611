//! Settings schema.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root settings, read from `aep.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub environment: EnvironmentSettings,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Capability store location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Store root. Defaults to `~/.aep/store`.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Isolated environment tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentSettings {
    #[serde(default = "default_installer")]
    pub installer: String,

    /// Interpreter passed to the installer when creating environments.
    #[serde(default)]
    pub python: Option<String>,

    #[serde(default = "default_tool_dependencies")]
    pub default_tool_dependencies: Vec<String>,

    /// Prepare a missing tools environment before routing commands.
    #[serde(default)]
    pub auto_init_tools: bool,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            installer: default_installer(),
            python: None,
            default_tool_dependencies: default_tool_dependencies(),
            auto_init_tools: false,
        }
    }
}

fn default_installer() -> String {
    "uv".to_string()
}

fn default_tool_dependencies() -> Vec<String> {
    vec![
        "numpy".to_string(),
        "pandas".to_string(),
        "matplotlib".to_string(),
    ]
}

/// Remote (MCP) server connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    /// Program generated stubs call back into. Defaults to the running executable.
    #[serde(default)]
    pub invoker: Option<PathBuf>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout(),
            protocol_version: default_protocol_version(),
            invoker: None,
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_protocol_version() -> String {
    "2024-11-05".to_string()
}

/// Logging output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_level")]
    pub level: String,

    /// Also write a daily-rotated log file under `~/.aep/logs`.
    #[serde(default = "default_true")]
    pub file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: default_true(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.environment.installer, "uv");
        assert_eq!(
            settings.environment.default_tool_dependencies,
            vec!["numpy", "pandas", "matplotlib"]
        );
        assert_eq!(settings.remote.request_timeout_seconds, 30);
        assert_eq!(settings.remote.protocol_version, "2024-11-05");
        assert_eq!(settings.logging.level, "warn");
        assert!(settings.logging.file);
        assert!(settings.store.root.is_none());
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [environment]
            python = "3.12"
            "#,
        )
        .unwrap();
        assert_eq!(settings.environment.python.as_deref(), Some("3.12"));
        assert_eq!(settings.environment.installer, "uv");
        assert!(!settings.environment.auto_init_tools);
    }
}
