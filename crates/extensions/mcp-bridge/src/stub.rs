//! Stub descriptors and the Python module rendered from them.
//!
//! A stub module holds no call logic of its own: every generated function
//! forwards to `_call_remote`, which re-enters `aep mcp call` so each call
//! is a fresh protocol round trip.

use std::collections::HashSet;
use std::path::Path;

use aep_core::registry::is_identifier;

use crate::protocol::McpToolDefinition;

/// Names a generated function may not take.
const RESERVED: &[&str] = &[
    "call",
    "json",
    "os",
    "subprocess",
    "_call_remote",
    "_SERVER",
    "_STORE",
    "_INVOKER",
];

/// A parameter of one remote function.
#[derive(Debug, Clone, PartialEq)]
pub struct StubParam {
    /// Python identifier.
    pub name: String,
    /// Name sent over the wire.
    pub wire_name: String,
    pub type_hint: Option<&'static str>,
    pub required: bool,
    /// Python literal for the schema default, if it is a scalar.
    pub default: Option<String>,
}

/// One remote function as it appears in the stub.
#[derive(Debug, Clone, PartialEq)]
pub struct StubFunction {
    pub name: String,
    pub wire_name: String,
    pub description: String,
    pub params: Vec<StubParam>,
}

/// Data-only description of a server's stub module.
#[derive(Debug, Clone, PartialEq)]
pub struct StubDescriptor {
    pub server: String,
    pub transport: String,
    pub functions: Vec<StubFunction>,
}

impl StubDescriptor {
    pub fn new(
        server: impl Into<String>,
        transport: impl Into<String>,
        definitions: &[McpToolDefinition],
    ) -> Self {
        let mut taken = HashSet::new();
        let functions = definitions
            .iter()
            .map(|def| StubFunction::from_definition(def, &mut taken))
            .collect();
        Self {
            server: server.into(),
            transport: transport.into(),
            functions,
        }
    }
}

impl StubFunction {
    fn from_definition(def: &McpToolDefinition, taken: &mut HashSet<String>) -> Self {
        let schema = &def.input_schema;
        let required: HashSet<&str> = schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        let mut param_names = HashSet::new();
        let mut params: Vec<StubParam> = schema
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|properties| {
                properties
                    .iter()
                    .map(|(wire_name, prop)| StubParam {
                        name: unique_identifier(wire_name, &mut param_names),
                        wire_name: wire_name.clone(),
                        type_hint: type_hint(prop),
                        required: required.contains(wire_name.as_str()),
                        default: prop.get("default").and_then(python_literal),
                    })
                    .collect()
            })
            .unwrap_or_default();
        // Stable: keeps schema order within each group.
        params.sort_by_key(|p| !p.required);

        Self {
            name: unique_identifier(&def.name, taken),
            wire_name: def.name.clone(),
            description: def.description.clone().unwrap_or_default(),
            params,
        }
    }

    fn signature(&self) -> String {
        self.params
            .iter()
            .map(|p| {
                let hint = p.type_hint.map(|h| format!(": {}", h)).unwrap_or_default();
                if p.required {
                    format!("{}{}", p.name, hint)
                } else {
                    let default = p.default.as_deref().unwrap_or("None");
                    format!("{}{} = {}", p.name, hint, default)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn summary(&self) -> &str {
        self.description
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("No description")
    }
}

/// Turn `raw` into a Python identifier not yet in `taken`.
pub fn unique_identifier(raw: &str, taken: &mut HashSet<String>) -> String {
    let mut base: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if base.is_empty() {
        base.push_str("arg");
    }
    if base.starts_with(|c: char| c.is_ascii_digit()) {
        base.insert(0, '_');
    }
    if !is_identifier(&base) || RESERVED.contains(&base.as_str()) {
        base.push('_');
    }

    let mut candidate = base.clone();
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format!("{}_{}", base, n);
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

fn type_hint(prop: &serde_json::Value) -> Option<&'static str> {
    let ty = match prop.get("type")? {
        serde_json::Value::String(s) => s.as_str(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .find(|t| *t != "null")?,
        _ => return None,
    };
    match ty {
        "string" => Some("str"),
        "integer" => Some("int"),
        "number" => Some("float"),
        "boolean" => Some("bool"),
        "array" => Some("list"),
        "object" => Some("dict"),
        _ => None,
    }
}

/// Render a JSON scalar as a Python literal.
fn python_literal(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => Some("None".to_string()),
        serde_json::Value::Bool(true) => Some("True".to_string()),
        serde_json::Value::Bool(false) => Some("False".to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(python_str(s)),
        _ => None,
    }
}

/// A double-quoted Python string literal.
fn python_str(s: &str) -> String {
    // JSON string escapes are a subset of Python's.
    serde_json::Value::String(s.to_string()).to_string()
}

fn docstring(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Where the stub calls back into.
#[derive(Debug, Clone)]
pub struct StubTarget<'a> {
    pub store: &'a Path,
    pub invoker: &'a Path,
}

const PRELUDE: &str = r#"import json
import os
import subprocess


def _call_remote(function, arguments):
    invoker = os.environ.get("AEP_BIN") or _INVOKER
    payload = {k: v for k, v in arguments.items() if v is not None}
    proc = subprocess.run(
        [invoker, "--store", _STORE, "mcp", "call", _SERVER, function, json.dumps(payload)],
        capture_output=True,
        text=True,
    )
    if proc.returncode != 0:
        message = proc.stderr.strip() or "exit status %d" % proc.returncode
        raise RuntimeError("%s.%s failed: %s" % (_SERVER, function, message))
    return proc.stdout.rstrip("\n")


def call(function, **kwargs):
    """Call a function of this server by its remote name."""
    return _call_remote(function, kwargs)
"#;

/// Render the Python module for `descriptor`.
pub fn render_stub(descriptor: &StubDescriptor, target: &StubTarget<'_>) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\"\"\"MCP server '{}' ({}).\n\nFunctions:\n",
        docstring(&descriptor.server),
        descriptor.transport
    ));
    if descriptor.functions.is_empty() {
        out.push_str("- none\n");
    }
    for function in &descriptor.functions {
        out.push_str(&format!(
            "- {}({}): {}\n",
            function.name,
            function
                .params
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            docstring(function.summary())
        ));
    }
    out.push_str(&format!(
        "\nGenerated by aep. Regenerate with `aep mcp refresh {}`.\n\"\"\"\n\n",
        descriptor.server
    ));

    out.push_str(&format!("_SERVER = {}\n", python_str(&descriptor.server)));
    out.push_str(&format!(
        "_STORE = {}\n",
        python_str(&target.store.to_string_lossy())
    ));
    out.push_str(&format!(
        "_INVOKER = {}\n\n",
        python_str(&target.invoker.to_string_lossy())
    ));
    out.push_str(PRELUDE);

    for function in &descriptor.functions {
        out.push_str(&format!(
            "\n\ndef {}({}):\n",
            function.name,
            function.signature()
        ));
        if !function.description.trim().is_empty() {
            out.push_str(&format!(
                "    \"\"\"{}\"\"\"\n",
                docstring(function.description.trim())
            ));
        }
        let arguments = function
            .params
            .iter()
            .map(|p| format!("{}: {}", python_str(&p.wire_name), p.name))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "    return _call_remote({}, {{{}}})\n",
            python_str(&function.wire_name),
            arguments
        ));
    }

    out
}

#[cfg(test)]
#[path = "stub_tests.rs"]
mod tests;
