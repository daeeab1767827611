//! YAML frontmatter of skill entry documents.
//!
//! ```markdown
//! ---
//! name: web-scraper
//! description: Fetch pages and extract tables
//! dependencies: [requests, beautifulsoup4]
//! ---
//!
//! # Web Scraper
//! ```

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Entry document names, in lookup order.
pub const ENTRY_DOCUMENTS: &[&str] = &["SKILL.md", "skill.md"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontmatterError {
    #[error("Entry document must start with YAML frontmatter (---)")]
    MissingOpening,

    #[error("Missing closing frontmatter delimiter (---)")]
    MissingClosing,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),

    #[error("Frontmatter must be a YAML mapping")]
    NotMapping,
}

/// Split a document into its frontmatter text and body.
pub fn extract_frontmatter(content: &str) -> Result<(String, String), FrontmatterError> {
    let content = content.trim_start_matches('\u{feff}').trim();

    if !content.starts_with("---") {
        return Err(FrontmatterError::MissingOpening);
    }

    let after_first = &content[3..];
    let end_pos = after_first
        .find("\n---")
        .ok_or(FrontmatterError::MissingClosing)?;

    let frontmatter = after_first[..end_pos].trim().to_string();
    let body = after_first[end_pos + 4..].trim().to_string();

    Ok((frontmatter, body))
}

/// Parse the frontmatter into a raw mapping, keeping unknown keys for validation.
pub fn parse_frontmatter(content: &str) -> Result<(Mapping, String), FrontmatterError> {
    let (yaml, body) = extract_frontmatter(content)?;
    if yaml.is_empty() {
        return Ok((Mapping::new(), body));
    }
    let value: Value =
        serde_yaml::from_str(&yaml).map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;
    match value {
        Value::Mapping(map) => Ok((map, body)),
        Value::Null => Ok((Mapping::new(), body)),
        _ => Err(FrontmatterError::NotMapping),
    }
}

/// The header fields the store itself relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillHeader {
    pub name: Option<String>,
    pub description: Option<String>,
    pub dependencies: Vec<String>,
}

impl SkillHeader {
    pub fn from_mapping(map: &Mapping) -> Self {
        Self {
            name: string_field(map, "name"),
            description: string_field(map, "description"),
            dependencies: string_list(map, "dependencies").unwrap_or_default(),
        }
    }

    pub fn parse(content: &str) -> Result<Self, FrontmatterError> {
        let (map, _) = parse_frontmatter(content)?;
        Ok(Self::from_mapping(&map))
    }
}

pub(crate) fn string_field(map: &Mapping, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) => Some(s.trim().to_string()),
        _ => None,
    }
}

/// `Some` only when the key holds a list made entirely of strings.
pub(crate) fn string_list(map: &Mapping, key: &str) -> Option<Vec<String>> {
    match map.get(key) {
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| item.as_str().map(|s| s.trim().to_string()))
            .collect(),
        _ => None,
    }
}

/// Locate the entry document inside a skill directory.
pub fn find_entry_document(skill_dir: &Path) -> Option<PathBuf> {
    ENTRY_DOCUMENTS
        .iter()
        .map(|name| skill_dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"---
name: web-scraper
description: Fetch pages and extract tables
dependencies:
  - requests
  - beautifulsoup4>=4.12
---

# Web Scraper

Run `scripts/scrape.py <url>`.
"#;

    #[test]
    fn test_extract_frontmatter() {
        let (frontmatter, body) = extract_frontmatter(SAMPLE).unwrap();
        assert!(frontmatter.starts_with("name: web-scraper"));
        assert!(body.starts_with("# Web Scraper"));
    }

    #[test]
    fn test_missing_opening() {
        assert_eq!(
            extract_frontmatter("# Title\n").unwrap_err(),
            FrontmatterError::MissingOpening
        );
    }

    #[test]
    fn test_missing_closing() {
        assert_eq!(
            extract_frontmatter("---\nname: x\n").unwrap_err(),
            FrontmatterError::MissingClosing
        );
    }

    #[test]
    fn test_header_fields() {
        let header = SkillHeader::parse(SAMPLE).unwrap();
        assert_eq!(header.name.as_deref(), Some("web-scraper"));
        assert_eq!(
            header.description.as_deref(),
            Some("Fetch pages and extract tables")
        );
        assert_eq!(header.dependencies, vec!["requests", "beautifulsoup4>=4.12"]);
    }

    #[test]
    fn test_not_a_mapping() {
        let err = parse_frontmatter("---\n- a\n- b\n---\n").unwrap_err();
        assert_eq!(err, FrontmatterError::NotMapping);
    }

    #[test]
    fn test_invalid_yaml() {
        let err = parse_frontmatter("---\nname: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, FrontmatterError::InvalidYaml(_)));
    }

    #[test]
    fn test_find_entry_document_order() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("skill.md"), "x").unwrap();
        assert_eq!(
            find_entry_document(temp.path()).unwrap().file_name().unwrap(),
            "skill.md"
        );
        std::fs::write(temp.path().join("SKILL.md"), "x").unwrap();
        assert_eq!(
            find_entry_document(temp.path()).unwrap().file_name().unwrap(),
            "SKILL.md"
        );
    }
}
