//! Remote adapter errors.

use std::fmt;

use aep_protocols::error::{EnvError, StorageError};
use thiserror::Error;

use crate::client::McpClientError;

/// Where a connection attempt stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Transport could not be opened or the handshake failed.
    ConnectFailed,
    /// Connected, but the function catalogue could not be read.
    DiscoverFailed,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::ConnectFailed => f.write_str("connect failed"),
            FailureStage::DiscoverFailed => f.write_str("discover failed"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote server parameters: {0}")]
    InvalidParameters(String),

    #[error("Remote server '{server}' {stage}: {source}")]
    Transport {
        server: String,
        stage: FailureStage,
        #[source]
        source: McpClientError,
    },

    #[error("Unknown remote server: {0}")]
    NotFound(String),

    #[error("Remote call {server}.{function} failed: {message}")]
    CallFailed {
        server: String,
        function: String,
        message: String,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Environment(#[from] EnvError),

    #[error("Invalid remote config: {0}")]
    Config(String),
}

impl RemoteError {
    pub(crate) fn transport(
        server: &str,
        stage: FailureStage,
        source: impl Into<McpClientError>,
    ) -> Self {
        Self::Transport {
            server: server.to_string(),
            stage,
            source: source.into(),
        }
    }

    /// Stage of a transport failure, if this is one.
    pub fn stage(&self) -> Option<FailureStage> {
        match self {
            RemoteError::Transport { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
