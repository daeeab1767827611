use super::*;
use crate::mock::{MockTransport, Reply, initialize_reply};
use crate::protocol::McpError;

#[tokio::test]
async fn test_initialize_sends_initialized_notification() {
    let transport = Arc::new(MockTransport::new(vec![initialize_reply()]));
    let mut client = McpClient::new(transport.clone()).with_protocol_version("2025-03-26");

    let result = client.initialize().await.unwrap();

    assert_eq!(result.server_info.unwrap().name, "echo");
    assert_eq!(client.server_info().unwrap().version.as_deref(), Some("1.0.0"));
    assert_eq!(
        *transport.notifications.lock().unwrap(),
        vec!["notifications/initialized"]
    );
    let requests = transport.requests.lock().unwrap();
    assert_eq!(
        requests[0].params.as_ref().unwrap()["protocolVersion"],
        "2025-03-26"
    );
}

#[tokio::test]
async fn test_list_tools() {
    let transport = Arc::new(MockTransport::new(vec![Reply::Result(serde_json::json!({
        "tools": [
            {
                "name": "test_tool",
                "description": "A test tool",
                "inputSchema": {"type": "object"}
            }
        ]
    }))]));
    let client = McpClient::new(transport);

    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "test_tool");
}

#[tokio::test]
async fn test_list_tools_follows_cursor() {
    let transport = Arc::new(MockTransport::new(vec![
        Reply::Result(serde_json::json!({"tools": [{"name": "a"}], "nextCursor": "2"})),
        Reply::Result(serde_json::json!({"tools": [{"name": "b"}]})),
    ]));
    let client = McpClient::new(transport.clone());

    let tools = client.list_tools().await.unwrap();

    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    let requests = transport.requests.lock().unwrap();
    assert!(requests[0].params.is_none());
    assert_eq!(requests[1].params.as_ref().unwrap()["cursor"], "2");
}

#[tokio::test]
async fn test_call_tool() {
    let transport = Arc::new(MockTransport::new(vec![Reply::Result(serde_json::json!({
        "content": [{"type": "text", "text": "Hello"}],
        "isError": false
    }))]));
    let client = McpClient::new(transport.clone());

    let result = client
        .call_tool("echo", serde_json::json!({"text": "Hello"}))
        .await
        .unwrap();

    assert!(!result.is_error);
    assert_eq!(result.text(), "Hello");
    let requests = transport.requests.lock().unwrap();
    assert_eq!(requests[0].params.as_ref().unwrap()["name"], "echo");
}

#[tokio::test]
async fn test_server_error() {
    let transport = Arc::new(MockTransport::new(vec![Reply::Error(McpError::new(
        McpError::METHOD_NOT_FOUND,
        "Method not found",
    ))]));
    let client = McpClient::new(transport);

    let result = client.list_tools().await;
    assert!(matches!(result, Err(McpClientError::Server(McpError { code: -32601, .. }))));
}

#[tokio::test]
async fn test_null_result_is_empty_page() {
    let transport = Arc::new(MockTransport::new(vec![Reply::Result(serde_json::Value::Null)]));
    let client = McpClient::new(transport);

    assert!(client.list_tools().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_result() {
    let transport = Arc::new(MockTransport::new(vec![Reply::Result(
        serde_json::json!({"content": "not a list"}),
    )]));
    let client = McpClient::new(transport);

    let err = client
        .call_tool("echo", serde_json::json!({}))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        McpClientError::Malformed {
            method: McpMethod::CallTool,
            ..
        }
    ));
}

#[tokio::test]
async fn test_transport_failure() {
    let transport = Arc::new(MockTransport::new(vec![Reply::Fail]));
    let mut client = McpClient::new(transport);

    let result = client.initialize().await;
    assert!(matches!(result, Err(McpClientError::Transport(_))));
}

#[tokio::test]
async fn test_request_ids_increase() {
    let transport = Arc::new(MockTransport::new(vec![
        Reply::Result(serde_json::json!({"tools": []})),
        Reply::Result(serde_json::json!({"tools": []})),
    ]));
    let client = McpClient::new(transport.clone());

    client.list_tools().await.unwrap();
    client.list_tools().await.unwrap();

    let requests = transport.requests.lock().unwrap();
    assert_ne!(requests[0].id, requests[1].id);
}

#[tokio::test]
async fn test_close_closes_transport() {
    let transport = Arc::new(MockTransport::new(vec![]));
    let client = McpClient::new(transport.clone());

    client.close().await.unwrap();
    assert!(*transport.closed.lock().unwrap());
}
