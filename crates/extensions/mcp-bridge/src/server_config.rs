//! Persisted connection record for one remote server.
//!
//! Stored as `_mcp/<server>/config.json`:
//!
//! ```json
//! {
//!   "name": "figma",
//!   "transport": "stdio",
//!   "command": "npx",
//!   "args": ["-y", "figma-mcp"],
//!   "env": {"FIGMA_TOKEN": "..."},
//!   "functions": [{"name": "get_file", "inputSchema": {...}}]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use aep_protocols::error::{IoResultExt, StorageError};
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use crate::protocol::McpToolDefinition;

/// Transport parameters, tagged by `transport`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum TransportSpec {
    /// Local process speaking newline-delimited JSON-RPC on stdio.
    Stdio {
        command: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
    },
    /// Streamable HTTP endpoint.
    Http {
        url: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
}

impl TransportSpec {
    /// Build from loosely typed CLI-style parameters, checking the combination.
    pub fn from_parts(
        kind: &str,
        command: Option<&str>,
        args: &[String],
        url: Option<&str>,
        pairs: BTreeMap<String, String>,
    ) -> Result<Self, RemoteError> {
        let spec = match kind {
            "stdio" => {
                if url.is_some() {
                    return Err(RemoteError::InvalidParameters(
                        "stdio transport does not take a url".to_string(),
                    ));
                }
                TransportSpec::Stdio {
                    command: command.unwrap_or_default().to_string(),
                    args: args.to_vec(),
                    env: pairs,
                }
            }
            "http" => {
                if command.is_some() || !args.is_empty() {
                    return Err(RemoteError::InvalidParameters(
                        "http transport does not take a command".to_string(),
                    ));
                }
                TransportSpec::Http {
                    url: url.unwrap_or_default().to_string(),
                    headers: pairs,
                }
            }
            other => {
                return Err(RemoteError::InvalidParameters(format!(
                    "unknown transport '{}', expected 'stdio' or 'http'",
                    other
                )));
            }
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TransportSpec::Stdio { .. } => "stdio",
            TransportSpec::Http { .. } => "http",
        }
    }

    pub fn validate(&self) -> Result<(), RemoteError> {
        match self {
            TransportSpec::Stdio { command, .. } if command.trim().is_empty() => Err(
                RemoteError::InvalidParameters("stdio transport requires a command".to_string()),
            ),
            TransportSpec::Http { url, .. } if url.trim().is_empty() => Err(
                RemoteError::InvalidParameters("http transport requires a url".to_string()),
            ),
            TransportSpec::Http { url, .. }
                if !(url.starts_with("http://") || url.starts_with("https://")) =>
            {
                Err(RemoteError::InvalidParameters(format!(
                    "url must start with http:// or https://: {}",
                    url
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Everything needed to reconnect to a server, plus its last catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteServerConfig {
    pub name: String,
    #[serde(flatten)]
    pub transport: TransportSpec,
    #[serde(default)]
    pub functions: Vec<McpToolDefinition>,
}

impl RemoteServerConfig {
    pub fn new(name: impl Into<String>, transport: TransportSpec) -> Self {
        Self {
            name: name.into(),
            transport,
            functions: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, RemoteError> {
        let content = fs::read_to_string(path).at_path(path)?;
        serde_json::from_str(&content)
            .map_err(|e| RemoteError::Storage(StorageError::corrupt(path, e.to_string())))
    }

    pub fn save(&self, path: &Path) -> Result<(), RemoteError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| RemoteError::Config(e.to_string()))?;
        fs::write(path, content + "\n").at_path(path)?;
        Ok(())
    }
}
