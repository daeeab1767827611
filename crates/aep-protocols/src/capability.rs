//! Capability data model.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The kinds of capability a store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Tool,
    Skill,
    LibraryDoc,
    RemoteStub,
}

impl CapabilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Tool => "tool",
            CapabilityKind::Skill => "skill",
            CapabilityKind::LibraryDoc => "library document",
            CapabilityKind::RemoteStub => "remote server",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a remote stub came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOrigin {
    pub server: String,
    pub transport: String,
}

/// A registered capability as seen from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityRecord {
    pub kind: CapabilityKind,
    /// External identity, unique within `kind`.
    pub name: String,
    pub location: PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_origin: Option<RemoteOrigin>,
}

impl CapabilityRecord {
    pub fn new(kind: CapabilityKind, name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            name: name.into(),
            location: location.into(),
            dependencies: Vec::new(),
            remote_origin: None,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_remote_origin(mut self, origin: RemoteOrigin) -> Self {
        self.kind = CapabilityKind::RemoteStub;
        self.remote_origin = Some(origin);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(CapabilityKind::Tool.to_string(), "tool");
        assert_eq!(CapabilityKind::LibraryDoc.to_string(), "library document");
    }

    #[test]
    fn test_record_serialization_skips_empty() {
        let record = CapabilityRecord::new(CapabilityKind::Tool, "grep", "/store/tools/grep.py");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "tool");
        assert!(json.get("dependencies").is_none());
        assert!(json.get("remote_origin").is_none());
    }

    #[test]
    fn test_remote_origin_switches_kind() {
        let record = CapabilityRecord::new(CapabilityKind::Tool, "figma", "/store/tools/figma.py")
            .with_remote_origin(RemoteOrigin {
                server: "figma".to_string(),
                transport: "stdio".to_string(),
            });
        assert_eq!(record.kind, CapabilityKind::RemoteStub);
        assert_eq!(record.remote_origin.unwrap().transport, "stdio");
    }
}
