//! Transports carrying JSON-RPC messages to an MCP server.

use std::collections::BTreeMap;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::debug;

use crate::protocol::{McpNotification, McpRequest, McpResponse};

/// Transport trait for MCP communication.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and receive its response.
    async fn send(&self, request: McpRequest) -> Result<McpResponse, TransportError>;

    /// Send a notification; no response is expected.
    async fn notify(&self, notification: McpNotification) -> Result<(), TransportError>;

    /// Close the transport.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Command '{command}' not found. {hint}")]
    CommandNotFound { command: String, hint: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Connection closed")]
    Closed,
}

/// Install hint for a missing server launch command.
pub fn command_hint(command: &str) -> String {
    match command {
        "npx" | "node" => "Install Node.js: https://nodejs.org/".to_string(),
        "uv" | "uvx" => {
            "Install uv: https://docs.astral.sh/uv/getting-started/installation/".to_string()
        }
        "python" | "python3" => "Install Python: https://www.python.org/downloads/".to_string(),
        other => format!("Make sure '{}' is installed and on PATH", other),
    }
}

/// Both ends of a server's pipes; held together so one request and its
/// response are never interleaved with another.
struct Pipes {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Pipes {
    async fn write_line(&mut self, json: &str) -> Result<(), TransportError> {
        self.stdin.write_all(json.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }
}

/// Stdio transport for subprocess MCP servers.
///
/// Messages are newline-delimited JSON. Lines that are not the awaited
/// response (server logs, notifications) are skipped.
pub struct StdioTransport {
    server: String,
    pipes: Mutex<Option<Pipes>>,
    child: Mutex<Option<Child>>,
}

impl StdioTransport {
    /// Spawn `command` with `env` merged over the host environment.
    pub async fn spawn(
        command: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
    ) -> Result<Self, TransportError> {
        if which::which(command).is_err() {
            return Err(TransportError::CommandNotFound {
                command: command.to_string(),
                hint: command_hint(command),
            });
        }

        let mut child = Command::new(command)
            .args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(TransportError::Process(format!(
                "'{}' started without piped stdio",
                command
            )));
        };

        if let Some(stderr) = child.stderr.take() {
            let server = command.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[{} stderr] {}", server, line);
                }
            });
        }
        debug!("Spawned MCP server '{}' (pid {:?})", command, child.id());

        Ok(Self {
            server: command.to_string(),
            pipes: Mutex::new(Some(Pipes {
                stdin,
                stdout: BufReader::new(stdout),
            })),
            child: Mutex::new(Some(child)),
        })
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&self, request: McpRequest) -> Result<McpResponse, TransportError> {
        let mut guard = self.pipes.lock().await;
        let pipes = guard.as_mut().ok_or(TransportError::Closed)?;
        pipes.write_line(&serde_json::to_string(&request)?).await?;

        let mut line = String::new();
        loop {
            line.clear();
            if pipes.stdout.read_line(&mut line).await? == 0 {
                return Err(TransportError::Closed);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
                debug!("[{} stdout] {}", self.server, trimmed);
                continue;
            };
            match McpResponse::matching(value, &request.id) {
                Some(response) => return Ok(response),
                None => debug!("Skipping unrelated message from {}: {}", self.server, trimmed),
            }
        }
    }

    async fn notify(&self, notification: McpNotification) -> Result<(), TransportError> {
        let mut guard = self.pipes.lock().await;
        let pipes = guard.as_mut().ok_or(TransportError::Closed)?;
        pipes.write_line(&serde_json::to_string(&notification)?).await
    }

    async fn close(&self) -> Result<(), TransportError> {
        // EOF on stdin lets a well-behaved server exit by itself
        self.pipes.lock().await.take();

        if let Some(mut child) = self.child.lock().await.take() {
            if child.try_wait()?.is_none() {
                child.kill().await?;
            }
        }
        Ok(())
    }
}
