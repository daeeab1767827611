//! Streamable HTTP transport for MCP communication.
//!
//! Every message is a POST to one endpoint. Responses arrive either as a
//! JSON body or as a `text/event-stream` whose `data:` events carry JSON-RPC
//! messages. The `Mcp-Session-Id` issued at initialization is echoed on
//! every later request, and a DELETE ends the session on close.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::protocol::{McpNotification, McpRequest, McpResponse, RequestId};
use crate::transport::{Transport, TransportError};

pub const SESSION_HEADER: &str = "Mcp-Session-Id";
const ACCEPT: &str = "application/json, text/event-stream";

/// HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpTransportConfig {
    /// MCP endpoint URL.
    pub url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Headers sent with every request (e.g., `Authorization`).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_timeout() -> u64 {
    30
}

/// HTTP transport for MCP servers.
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
    session_id: Mutex<Option<String>>,
    closed: Mutex<bool>,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            client,
            config,
            session_id: Mutex::new(None),
            closed: Mutex::new(false),
        })
    }

    pub async fn session_id(&self) -> Option<String> {
        self.session_id.lock().await.clone()
    }

    async fn decorate(&self, mut req: RequestBuilder) -> RequestBuilder {
        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }
        if let Some(session) = self.session_id.lock().await.as_ref() {
            req = req.header(SESSION_HEADER, session);
        }
        req
    }

    async fn post(&self, body: &impl Serialize) -> Result<Response, TransportError> {
        if *self.closed.lock().await {
            return Err(TransportError::Closed);
        }

        let req = self
            .client
            .post(&self.config.url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, ACCEPT);
        let response = self
            .decorate(req)
            .await
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            let mut current = self.session_id.lock().await;
            if current.as_deref() != Some(session) {
                debug!("MCP session established: {}", session);
                *current = Some(session.to_string());
            }
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {}: {}", status, body)));
        }

        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: McpRequest) -> Result<McpResponse, TransportError> {
        let id = request.id.clone();
        let response = self.post(&request).await?;

        let is_stream = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if is_stream {
            return response_from_event_stream(&body, &id)
                .ok_or_else(|| TransportError::Http("Event stream ended without a response".into()));
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        match value {
            serde_json::Value::Array(messages) => messages
                .into_iter()
                .find_map(|m| McpResponse::matching(m, &id))
                .ok_or_else(|| TransportError::Http("Batch did not contain a response".into())),
            value => Ok(serde_json::from_value(value)?),
        }
    }

    async fn notify(&self, notification: McpNotification) -> Result<(), TransportError> {
        self.post(&notification).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut closed = self.closed.lock().await;
        if *closed {
            return Ok(());
        }
        *closed = true;

        if let Some(session) = self.session_id.lock().await.take() {
            let mut req = self
                .client
                .delete(&self.config.url)
                .header(SESSION_HEADER, &session);
            for (key, value) in &self.config.headers {
                req = req.header(key, value);
            }
            // Servers may refuse explicit termination (405); the session just expires.
            if let Err(e) = req.send().await {
                debug!("MCP session delete failed: {}", e);
            }
        }
        Ok(())
    }
}

/// Find the response to `id` among the `data:` events of an SSE body.
pub(crate) fn response_from_event_stream(body: &str, id: &RequestId) -> Option<McpResponse> {
    let mut data = String::new();
    let mut events = Vec::new();

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            if !data.is_empty() {
                events.push(std::mem::take(&mut data));
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if !data.is_empty() {
        events.push(data);
    }

    events.into_iter().find_map(|event| {
        let value: serde_json::Value = serde_json::from_str(&event).ok()?;
        McpResponse::matching(value, id)
    })
}

#[cfg(test)]
#[path = "http_transport_tests.rs"]
mod tests;
