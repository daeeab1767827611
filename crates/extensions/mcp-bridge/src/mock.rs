use std::sync::Mutex;

use async_trait::async_trait;

use crate::protocol::{McpError, McpNotification, McpRequest, McpResponse};
use crate::transport::{Transport, TransportError};

/// Scripted reply for one request.
pub(crate) enum Reply {
    Result(serde_json::Value),
    Error(McpError),
    Fail,
}

/// Answers requests in order, echoing each request's id.
pub(crate) struct MockTransport {
    replies: Mutex<Vec<Reply>>,
    pub requests: Mutex<Vec<McpRequest>>,
    pub notifications: Mutex<Vec<String>>,
    pub closed: Mutex<bool>,
}

impl MockTransport {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
            closed: Mutex::new(false),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: McpRequest) -> Result<McpResponse, TransportError> {
        let id = request.id.clone();
        self.requests.lock().unwrap().push(request);
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(TransportError::Closed);
        }
        match replies.remove(0) {
            Reply::Result(value) => Ok(McpResponse::success(id, value)),
            Reply::Error(error) => Ok(McpResponse::failure(id, error)),
            Reply::Fail => Err(TransportError::Process("server crashed".to_string())),
        }
    }

    async fn notify(&self, notification: McpNotification) -> Result<(), TransportError> {
        self.notifications.lock().unwrap().push(notification.method);
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

pub(crate) fn initialize_reply() -> Reply {
    Reply::Result(serde_json::json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {"tools": {}},
        "serverInfo": {"name": "echo", "version": "1.0.0"}
    }))
}
