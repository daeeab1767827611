//! JSON-RPC 2.0 messages and the part of MCP the bridge speaks.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Methods the bridge sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpMethod {
    Initialize,
    Initialized,
    ListTools,
    CallTool,
}

impl McpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            McpMethod::Initialize => "initialize",
            McpMethod::Initialized => "notifications/initialized",
            McpMethod::ListTools => "tools/list",
            McpMethod::CallTool => "tools/call",
        }
    }
}

impl fmt::Display for McpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request id. The bridge sends numbers; servers may echo either form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl McpRequest {
    pub fn new(id: impl Into<RequestId>, method: McpMethod, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.as_str().to_string(),
            params,
        }
    }
}

/// Message without an id; no response is expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl McpNotification {
    /// Sent once the `initialize` response arrived.
    pub fn initialized() -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: McpMethod::Initialized.as_str().to_string(),
            params: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

impl McpResponse {
    pub fn success(id: impl Into<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: impl Into<RequestId>, error: McpError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            result: None,
            error: Some(error),
        }
    }

    /// The result payload (`null` when absent), or the server's error.
    pub fn into_result(self) -> Result<Value, McpError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }

    /// Parse `value` as the response to request `id`.
    ///
    /// Server notifications, server-initiated requests and responses to other
    /// ids yield `None`.
    pub fn matching(value: Value, id: &RequestId) -> Option<Self> {
        if value.get("method").is_some() {
            return None;
        }
        if value.get("result").is_none() && value.get("error").is_none() {
            return None;
        }
        let response: McpResponse = serde_json::from_value(value).ok()?;
        (response.id == *id).then_some(response)
    }
}

/// Error object of a failed JSON-RPC call.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct McpError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpError {
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INTERNAL_ERROR: i32 = -32603;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// `initialize` result, reduced to what gets logged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion", default)]
    pub protocol_version: Option<String>,
    #[serde(rename = "serverInfo", default)]
    pub server_info: Option<ServerInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// A remote function as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpToolDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default = "empty_schema")]
    pub input_schema: Value,
}

fn empty_schema() -> Value {
    serde_json::json!({"type": "object"})
}

/// One page of `tools/list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct McpToolPage {
    #[serde(default)]
    pub tools: Vec<McpToolDefinition>,
    #[serde(rename = "nextCursor", default)]
    pub next_cursor: Option<String>,
}

/// `tools/call` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolResult {
    #[serde(default)]
    pub content: Vec<McpContent>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl McpToolResult {
    /// Textual parts joined by newlines. Binary payloads contribute their base64 data.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(McpContent::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum McpContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Audio {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Resource {
        resource: Value,
    },
    ResourceLink {
        uri: String,
    },
}

impl McpContent {
    fn as_text(&self) -> Option<&str> {
        match self {
            McpContent::Text { text } => Some(text),
            McpContent::Image { data, .. } | McpContent::Audio { data, .. } => Some(data),
            McpContent::Resource { resource } => resource.get("text").and_then(Value::as_str),
            McpContent::ResourceLink { uri } => Some(uri),
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
