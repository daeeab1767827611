use std::path::PathBuf;

use super::*;

fn definition(name: &str, schema: serde_json::Value) -> McpToolDefinition {
    McpToolDefinition {
        name: name.to_string(),
        description: Some(format!("Does {}", name)),
        input_schema: schema,
    }
}

fn render(descriptor: &StubDescriptor) -> String {
    let store = PathBuf::from("/store");
    let invoker = PathBuf::from("/usr/bin/aep");
    render_stub(
        descriptor,
        &StubTarget {
            store: &store,
            invoker: &invoker,
        },
    )
}

#[test]
fn test_unique_identifier_sanitizes() {
    let mut taken = HashSet::new();
    assert_eq!(unique_identifier("get-file", &mut taken), "get_file");
    assert_eq!(unique_identifier("get.file", &mut taken), "get_file_2");
    assert_eq!(unique_identifier("2fa", &mut taken), "_2fa");
    assert_eq!(unique_identifier("class", &mut taken), "class_");
    assert_eq!(unique_identifier("call", &mut taken), "call_");
    assert_eq!(unique_identifier("", &mut taken), "arg");
}

#[test]
fn test_required_params_come_first() {
    let def = definition(
        "search",
        serde_json::json!({
            "type": "object",
            "properties": {
                "limit": {"type": "integer", "default": 10},
                "query": {"type": "string"},
                "verbose": {"type": "boolean", "default": false}
            },
            "required": ["query"]
        }),
    );
    let descriptor = StubDescriptor::new("web", "stdio", &[def]);
    let function = &descriptor.functions[0];

    let names: Vec<_> = function.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["query", "limit", "verbose"]);
    assert_eq!(
        function.signature(),
        "query: str, limit: int = 10, verbose: bool = False"
    );
}

#[test]
fn test_optional_without_default_is_none() {
    let def = definition(
        "fetch",
        serde_json::json!({
            "properties": {
                "tags": {"type": "array"},
                "mode": {"type": ["string", "null"]},
                "extra": {"default": {"a": 1}}
            }
        }),
    );
    let descriptor = StubDescriptor::new("web", "http", &[def]);
    let signature = descriptor.functions[0].signature();
    assert!(signature.contains("tags: list = None"));
    assert!(signature.contains("mode: str = None"));
    assert!(signature.contains("extra = None"));
}

#[test]
fn test_wire_names_are_preserved() {
    let def = definition(
        "get-file",
        serde_json::json!({
            "properties": {"file-key": {"type": "string"}},
            "required": ["file-key"]
        }),
    );
    let descriptor = StubDescriptor::new("figma", "stdio", &[def]);
    let source = render(&descriptor);

    assert!(source.contains("def get_file(file_key: str):"));
    assert!(source.contains("return _call_remote(\"get-file\", {\"file-key\": file_key})"));
}

#[test]
fn test_render_module_header() {
    let descriptor = StubDescriptor::new(
        "figma",
        "stdio",
        &[definition("get_file", serde_json::json!({"type": "object"}))],
    );
    let source = render(&descriptor);

    assert!(source.starts_with("\"\"\"MCP server 'figma' (stdio)."));
    assert!(source.contains("- get_file(): Does get_file"));
    assert!(source.contains("_SERVER = \"figma\""));
    assert!(source.contains("_STORE = \"/store\""));
    assert!(source.contains("_INVOKER = \"/usr/bin/aep\""));
    assert!(source.contains("def call(function, **kwargs):"));
    assert!(source.contains("def get_file():"));
    assert!(source.contains("return _call_remote(\"get_file\", {})"));
}

#[test]
fn test_docstring_quotes_escaped() {
    let mut def = definition("quote", serde_json::json!({}));
    def.description = Some("Returns \"text\"\\n".to_string());
    let source = render(&StubDescriptor::new("q", "stdio", &[def]));
    assert!(source.contains(r#""""Returns \"text\"\\n""""#));
}

#[test]
fn test_empty_catalogue() {
    let source = render(&StubDescriptor::new("empty", "http", &[]));
    assert!(source.contains("- none"));
    assert!(source.contains("def call(function, **kwargs):"));
}

#[test]
fn test_functions_cannot_shadow_module_globals() {
    let source = render(&StubDescriptor::new(
        "figma",
        "stdio",
        &[
            definition("_SERVER", serde_json::json!({})),
            definition("_INVOKER", serde_json::json!({})),
        ],
    ));
    assert!(source.contains("def _SERVER_():"));
    assert!(source.contains("return _call_remote(\"_SERVER\", {})"));
    assert!(source.contains("def _INVOKER_():"));
    assert!(!source.contains("def _SERVER():"));
    assert!(source.contains("_SERVER = \"figma\""));
}
