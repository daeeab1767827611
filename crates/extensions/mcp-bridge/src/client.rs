//! Session with one MCP server over a [`Transport`].

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::protocol::{
    InitializeResult, McpError, McpMethod, McpNotification, McpRequest, McpToolDefinition,
    McpToolPage, McpToolResult, ServerInfo,
};
use crate::transport::{Transport, TransportError};

pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Upper bound on `tools/list` pages, against servers that repeat cursors.
const MAX_TOOL_PAGES: usize = 100;

pub struct McpClient {
    transport: Arc<dyn Transport>,
    next_id: AtomicI64,
    protocol_version: String,
    server: Option<ServerInfo>,
}

impl McpClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            next_id: AtomicI64::new(1),
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            server: None,
        }
    }

    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Server identity from the handshake, when it sent one.
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server.as_ref()
    }

    /// Send one request and decode its result as `T`.
    ///
    /// A `null` or missing result decodes as an empty object.
    async fn call<T: DeserializeOwned>(
        &self,
        method: McpMethod,
        params: Option<Value>,
    ) -> Result<T, McpClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("MCP {} (id={})", method, id);

        let response = self
            .transport
            .send(McpRequest::new(id, method, params))
            .await?;
        let result = match response.into_result()? {
            Value::Null => Value::Object(Default::default()),
            result => result,
        };
        serde_json::from_value(result).map_err(|e| McpClientError::Malformed {
            method,
            message: e.to_string(),
        })
    }

    /// `initialize` handshake followed by `notifications/initialized`.
    pub async fn initialize(&mut self) -> Result<InitializeResult, McpClientError> {
        let params = serde_json::json!({
            "protocolVersion": self.protocol_version,
            "capabilities": {},
            "clientInfo": {
                "name": "aep",
                "version": env!("CARGO_PKG_VERSION")
            }
        });
        let result: InitializeResult = self.call(McpMethod::Initialize, Some(params)).await?;
        self.transport.notify(McpNotification::initialized()).await?;

        match &result.server_info {
            Some(server) => info!(
                "Connected to MCP server {} {}",
                server.name,
                server.version.as_deref().unwrap_or("")
            ),
            None => info!("Connected to MCP server"),
        }
        self.server = result.server_info.clone();
        Ok(result)
    }

    /// Every advertised function, following `nextCursor` pagination.
    pub async fn list_tools(&self) -> Result<Vec<McpToolDefinition>, McpClientError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_TOOL_PAGES {
            let params = cursor.as_ref().map(|c| serde_json::json!({ "cursor": c }));
            let page: McpToolPage = self.call(McpMethod::ListTools, params).await?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() && cursor.as_deref() != Some(next.as_str()) => {
                    cursor = Some(next)
                }
                _ => return Ok(tools),
            }
        }

        Err(McpClientError::Malformed {
            method: McpMethod::ListTools,
            message: format!("pagination did not end within {} pages", MAX_TOOL_PAGES),
        })
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<McpToolResult, McpClientError> {
        let params = serde_json::json!({ "name": name, "arguments": arguments });
        self.call(McpMethod::CallTool, Some(params)).await
    }

    pub async fn close(&self) -> Result<(), McpClientError> {
        self.transport.close().await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum McpClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("server error: {0}")]
    Server(#[from] McpError),

    #[error("malformed {method} result: {message}")]
    Malformed { method: McpMethod, message: String },
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
