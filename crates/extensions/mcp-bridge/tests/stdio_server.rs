//! End-to-end discovery against a scripted stdio server.

#![cfg(unix)]

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aep_config::StoreLayout;
use aep_core::LifecycleManager;
use aep_mcp_bridge::{DefaultConnector, RemoteAdapter, TransportSpec};
use aep_protocols::error::EnvError;
use aep_protocols::{Environment, EnvironmentPort};
use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;

const SERVER: &str = r#"
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
  [ -z "$id" ] && continue
  case "$line" in
    *'"method":"initialize"'*)
      echo "starting" >&2
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"sh","version":"0"}}}\n' "$id" ;;
    *'"method":"tools/list"'*)
      echo '{"jsonrpc":"2.0","method":"notifications/message","params":{"level":"info"}}'
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"echo","description":"Echo text back","inputSchema":{"type":"object","properties":{"text":{"type":"string"}},"required":["text"]}}]}}\n' "$id" ;;
    *'"method":"tools/call"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"pong"}]}}\n' "$id" ;;
  esac
done
"#;

/// Never asked to do anything: no dependencies are declared.
struct UnusedPort;

#[async_trait]
impl EnvironmentPort for UnusedPort {
    async fn create(&self, _env: &Environment) -> Result<(), EnvError> {
        Err(EnvError::Missing("tools".to_string()))
    }

    async fn install(&self, _env: &Environment, _requirements: &[String]) -> Result<(), EnvError> {
        Err(EnvError::Missing("tools".to_string()))
    }

    fn interpreter(&self, env: &Environment) -> PathBuf {
        env.dir.join("bin/python")
    }

    fn command_in(&self, _env: &Environment, program: &OsStr) -> Command {
        Command::new(program)
    }
}

fn adapter(root: &Path) -> RemoteAdapter {
    let layout = StoreLayout::new(root);
    layout.create_dirs().unwrap();
    let manager = LifecycleManager::new(layout, Arc::new(UnusedPort));
    RemoteAdapter::new(
        manager,
        Arc::new(DefaultConnector::new(5)),
        PathBuf::from("aep"),
    )
}

fn server_spec(dir: &Path) -> TransportSpec {
    let script = dir.join("server.sh");
    fs::write(&script, SERVER).unwrap();
    TransportSpec::Stdio {
        command: "sh".to_string(),
        args: vec![script.to_string_lossy().to_string()],
        env: Default::default(),
    }
}

#[tokio::test]
async fn test_discovers_and_calls_stdio_server() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("store");
    let adapter = adapter(&store);

    let stub = adapter
        .add("shell_echo", server_spec(temp.path()), &[])
        .await
        .unwrap();

    let source = fs::read_to_string(&stub).unwrap();
    assert!(source.contains("def echo(text: str):"));
    assert!(source.contains("Echo text back"));

    let config = adapter.get_config("shell_echo").unwrap().unwrap();
    assert_eq!(config.functions[0].name, "echo");

    let reply = adapter
        .invoke("shell_echo", "echo", serde_json::json!({"text": "ping"}))
        .await
        .unwrap();
    assert_eq!(reply, "pong");
}

#[tokio::test]
async fn test_missing_command_fails_without_files() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("store");
    let adapter = adapter(&store);
    let spec = TransportSpec::Stdio {
        command: "definitely-not-an-mcp-server".to_string(),
        args: Vec::new(),
        env: Default::default(),
    };

    let err = adapter.add("ghost", spec, &[]).await.unwrap_err();

    assert!(err.to_string().contains("connect failed"));
    assert!(!store.join("tools/ghost.py").exists());
    assert!(adapter.list().unwrap().is_empty());
}
