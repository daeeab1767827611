//! MCP (Model Context Protocol) bridge for AEP.
//!
//! Connects to remote MCP servers over stdio or streamable HTTP, discovers
//! their functions, and installs a generated tools module per server.

mod adapter;
mod client;
mod error;
mod http_transport;
mod protocol;
mod server_config;
mod stub;
mod transport;

#[cfg(test)]
mod mock;

pub use adapter::{AdapterState, Connector, DefaultConnector, RemoteAdapter};
pub use client::{DEFAULT_PROTOCOL_VERSION, McpClient, McpClientError};
pub use error::{FailureStage, RemoteError};
pub use http_transport::{HttpTransport, HttpTransportConfig};
pub use protocol::{
    InitializeResult, McpContent, McpError, McpMethod, McpNotification, McpRequest, McpResponse,
    McpToolDefinition, McpToolResult, RequestId, ServerInfo,
};
pub use server_config::{RemoteServerConfig, TransportSpec};
pub use stub::{StubDescriptor, StubFunction, StubParam, StubTarget, render_stub};
pub use transport::{StdioTransport, Transport, TransportError};
