//! Remote capability adapter.
//!
//! Turns a remote MCP server into a tools module. Each connection attempt
//! walks `Init -> Connecting -> Discovering -> Committed`, or ends in
//! `Failed` with nothing written. The stub module and the connection record
//! are staged side by side and only swapped in together once discovery has
//! succeeded.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use aep_config::{RemoteSettings, StoreLayout};
use aep_core::registry::is_identifier;
use aep_core::{LifecycleManager, StagedBundle};
use aep_protocols::Scope;
use aep_protocols::error::IoResultExt;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::{DEFAULT_PROTOCOL_VERSION, McpClient, McpClientError};
use crate::error::{FailureStage, RemoteError};
use crate::http_transport::{HttpTransport, HttpTransportConfig};
use crate::protocol::McpToolDefinition;
use crate::server_config::{RemoteServerConfig, TransportSpec};
use crate::stub::{StubDescriptor, StubTarget, render_stub};
use crate::transport::{StdioTransport, Transport, TransportError};

const CONFIG_FILE: &str = "config.json";

/// Opens a transport for a connection spec.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, spec: &TransportSpec) -> Result<Arc<dyn Transport>, TransportError>;
}

/// Spawns stdio servers and opens HTTP sessions.
#[derive(Debug, Clone)]
pub struct DefaultConnector {
    timeout_seconds: u64,
}

impl DefaultConnector {
    pub fn new(timeout_seconds: u64) -> Self {
        Self { timeout_seconds }
    }
}

#[async_trait]
impl Connector for DefaultConnector {
    async fn connect(&self, spec: &TransportSpec) -> Result<Arc<dyn Transport>, TransportError> {
        match spec {
            TransportSpec::Stdio { command, args, env } => {
                let transport = StdioTransport::spawn(command, args, env).await?;
                Ok(Arc::new(transport))
            }
            TransportSpec::Http { url, headers } => {
                let transport = HttpTransport::new(HttpTransportConfig {
                    url: url.clone(),
                    timeout_seconds: self.timeout_seconds,
                    headers: headers.clone(),
                })?;
                Ok(Arc::new(transport))
            }
        }
    }
}

/// Progress of one connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Init,
    Connecting,
    Discovering,
    Committed,
    Failed,
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdapterState::Init => "init",
            AdapterState::Connecting => "connecting",
            AdapterState::Discovering => "discovering",
            AdapterState::Committed => "committed",
            AdapterState::Failed => "failed",
        };
        f.write_str(s)
    }
}

struct Attempt<'a> {
    server: &'a str,
    state: AdapterState,
}

impl<'a> Attempt<'a> {
    fn new(server: &'a str) -> Self {
        Self {
            server,
            state: AdapterState::Init,
        }
    }

    fn enter(&mut self, next: AdapterState) {
        debug!("Remote server {}: {} -> {}", self.server, self.state, next);
        self.state = next;
    }

    fn fail(&mut self, stage: FailureStage, source: impl Into<McpClientError>) -> RemoteError {
        self.enter(AdapterState::Failed);
        RemoteError::transport(self.server, stage, source)
    }
}

pub struct RemoteAdapter {
    manager: LifecycleManager,
    connector: Arc<dyn Connector>,
    protocol_version: String,
    invoker: PathBuf,
}

impl RemoteAdapter {
    pub fn new(manager: LifecycleManager, connector: Arc<dyn Connector>, invoker: PathBuf) -> Self {
        Self {
            manager,
            connector,
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            invoker,
        }
    }

    /// Adapter using the real transports. Stubs call back into
    /// `settings.invoker`, or the running executable.
    pub fn from_settings(manager: LifecycleManager, settings: &RemoteSettings) -> Self {
        let invoker = settings.invoker.clone().unwrap_or_else(|| {
            std::env::current_exe().unwrap_or_else(|_| PathBuf::from("aep"))
        });
        Self::new(
            manager,
            Arc::new(DefaultConnector::new(settings.request_timeout_seconds)),
            invoker,
        )
        .with_protocol_version(settings.protocol_version.clone())
    }

    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    fn layout(&self) -> &StoreLayout {
        self.manager.layout()
    }

    /// Connect, discover the catalogue, and install the stub for `name`.
    ///
    /// Returns the stub module path.
    pub async fn add(
        &self,
        name: &str,
        transport: TransportSpec,
        dependencies: &[String],
    ) -> Result<PathBuf, RemoteError> {
        check_name(name)?;
        transport.validate()?;

        let mut attempt = Attempt::new(name);
        let functions = self.discover(&mut attempt, &transport).await?;
        let config = RemoteServerConfig {
            name: name.to_string(),
            transport,
            functions,
        };
        let path = self.commit(&config, dependencies).await?;
        attempt.enter(AdapterState::Committed);
        info!(
            "Added remote server {} with {} functions",
            name,
            config.functions.len()
        );
        Ok(path)
    }

    /// Re-discover `name` with its stored connection and overwrite the stub.
    pub async fn refresh(&self, name: &str) -> Result<PathBuf, RemoteError> {
        let mut config = self
            .get_config(name)?
            .ok_or_else(|| RemoteError::NotFound(name.to_string()))?;

        let mut attempt = Attempt::new(name);
        config.functions = self.discover(&mut attempt, &config.transport).await?;
        let path = self.commit(&config, &[]).await?;
        attempt.enter(AdapterState::Committed);
        info!(
            "Refreshed remote server {} ({} functions)",
            name,
            config.functions.len()
        );
        Ok(path)
    }

    pub fn get_config(&self, name: &str) -> Result<Option<RemoteServerConfig>, RemoteError> {
        check_name(name)?;
        let path = self.layout().mcp_config_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        RemoteServerConfig::load(&path).map(Some)
    }

    /// Delete the connection record and its stub. Returns whether the server existed.
    ///
    /// A tool module without a connection record is not a remote server and is
    /// left alone.
    pub fn remove(&self, name: &str) -> Result<bool, RemoteError> {
        check_name(name)?;
        if !self.layout().mcp_config_path(name).is_file() {
            return Ok(false);
        }
        let config_dir = self.layout().mcp_dir().join(name);
        fs::remove_dir_all(&config_dir).at_path(&config_dir)?;
        let stub = self.layout().tool_path(name);
        if stub.is_file() {
            fs::remove_file(&stub).at_path(&stub)?;
        }
        info!("Removed remote server {}", name);
        Ok(true)
    }

    /// Servers with a connection record, by name.
    pub fn list(&self) -> Result<Vec<String>, RemoteError> {
        let dir = self.layout().mcp_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).at_path(&dir)? {
            let entry = entry.at_path(&dir)?;
            let name = entry.file_name().to_string_lossy().to_string();
            if StoreLayout::is_capability_entry(&name) && entry.path().join(CONFIG_FILE).is_file() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Open a fresh connection and call one remote function.
    ///
    /// Returns the text content of the result.
    pub async fn invoke(
        &self,
        name: &str,
        function: &str,
        arguments: serde_json::Value,
    ) -> Result<String, RemoteError> {
        if !arguments.is_object() {
            return Err(RemoteError::InvalidParameters(
                "arguments must be a JSON object".to_string(),
            ));
        }
        let config = self
            .get_config(name)?
            .ok_or_else(|| RemoteError::NotFound(name.to_string()))?;

        let client = self.open(name, &config.transport).await?;
        let outcome = client.call_tool(function, arguments).await;
        if let Err(e) = client.close().await {
            debug!("Closing {} after call failed: {}", name, e);
        }

        let call_failed = |message: String| RemoteError::CallFailed {
            server: name.to_string(),
            function: function.to_string(),
            message,
        };
        let result = outcome.map_err(|e| call_failed(e.to_string()))?;
        if result.is_error {
            return Err(call_failed(result.text()));
        }
        Ok(result.text())
    }

    async fn open(&self, name: &str, spec: &TransportSpec) -> Result<McpClient, RemoteError> {
        let mut attempt = Attempt::new(name);
        self.connect(&mut attempt, spec).await
    }

    async fn connect(
        &self,
        attempt: &mut Attempt<'_>,
        spec: &TransportSpec,
    ) -> Result<McpClient, RemoteError> {
        attempt.enter(AdapterState::Connecting);
        let transport = self
            .connector
            .connect(spec)
            .await
            .map_err(|e| attempt.fail(FailureStage::ConnectFailed, e))?;

        let mut client =
            McpClient::new(transport).with_protocol_version(self.protocol_version.clone());
        if let Err(e) = client.initialize().await {
            let _ = client.close().await;
            return Err(attempt.fail(FailureStage::ConnectFailed, e));
        }
        Ok(client)
    }

    async fn discover(
        &self,
        attempt: &mut Attempt<'_>,
        spec: &TransportSpec,
    ) -> Result<Vec<McpToolDefinition>, RemoteError> {
        let client = self.connect(attempt, spec).await?;

        attempt.enter(AdapterState::Discovering);
        let listed = client.list_tools().await;
        if let Err(e) = client.close().await {
            debug!("Closing {} after discovery failed: {}", attempt.server, e);
        }
        listed.map_err(|e| attempt.fail(FailureStage::DiscoverFailed, e))
    }

    /// Write stub and record into staging, then swap both in.
    async fn commit(
        &self,
        config: &RemoteServerConfig,
        dependencies: &[String],
    ) -> Result<PathBuf, RemoteError> {
        let layout = self.layout();
        let tools_dir = layout.tools_dir();
        let mcp_dir = layout.mcp_dir();
        for dir in [&tools_dir, &mcp_dir] {
            fs::create_dir_all(dir).at_path(dir)?;
        }

        let descriptor =
            StubDescriptor::new(&config.name, config.transport.kind(), &config.functions);
        let source = render_stub(
            &descriptor,
            &StubTarget {
                store: layout.root(),
                invoker: &self.invoker,
            },
        );

        let mut stub = StagedBundle::new(&tools_dir, &format!("{}.py", config.name))?;
        fs::write(stub.staged_path(), source).at_path(stub.staged_path())?;

        let mut record = StagedBundle::new(&mcp_dir, &config.name)?;
        fs::create_dir_all(record.staged_path()).at_path(record.staged_path())?;
        config.save(&record.staged_path().join(CONFIG_FILE))?;

        // Dropping either bundle on an error below rolls both back.
        stub.swap_in()?;
        record.swap_in()?;
        if stub.replaced_existing() {
            debug!("Replaced tool module {}", config.name);
        }

        if !dependencies.is_empty() {
            self.manager
                .declare_and_sync(&Scope::Tools, dependencies)
                .await?;
        }

        let path = stub.finish();
        record.finish();
        Ok(path)
    }
}

/// Server names double as a directory under `_mcp/` and a module under `tools/`.
fn check_name(name: &str) -> Result<(), RemoteError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(RemoteError::InvalidParameters(format!(
            "server name '{}' must be a Python identifier",
            name
        )))
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
