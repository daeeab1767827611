//! Settings validation.

use std::fmt;

use crate::schema::Settings;

/// Timeouts above this many seconds are accepted but reported.
const LONG_TIMEOUT_SECONDS: u64 = 600;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// One problem found in the settings, addressed by its dotted key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub path: String,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors block startup; warnings are only logged.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(Issue {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(Issue {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub struct SettingsValidator;

impl SettingsValidator {
    pub fn validate(settings: &Settings) -> ValidationResult {
        let mut result = ValidationResult::default();
        let env = &settings.environment;
        let remote = &settings.remote;

        if env.installer.trim().is_empty() {
            result.error("environment.installer", "installer program cannot be empty");
        }
        if env.python.as_deref().is_some_and(|p| p.trim().is_empty()) {
            result.error("environment.python", "interpreter cannot be blank when set");
        }
        for (i, dep) in env.default_tool_dependencies.iter().enumerate() {
            if dep.trim().is_empty() {
                result.error(
                    format!("environment.default_tool_dependencies[{}]", i),
                    "requirement cannot be blank",
                );
            }
        }

        match remote.request_timeout_seconds {
            0 => result.error("remote.request_timeout_seconds", "must be greater than 0"),
            secs if secs > LONG_TIMEOUT_SECONDS => result.warning(
                "remote.request_timeout_seconds",
                format!("{}s is very long; a stuck server blocks that long", secs),
            ),
            _ => {}
        }
        if remote.protocol_version.trim().is_empty() {
            result.error("remote.protocol_version", "protocol version cannot be empty");
        }

        let level = settings.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            result.warning(
                "logging.level",
                format!("unknown level '{}'", settings.logging.level),
            );
        }

        result
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
