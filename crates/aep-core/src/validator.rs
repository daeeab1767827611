//! Registration checks for skill bundles.
//!
//! Every violation is collected so a rejected skill reports all of its
//! problems at once.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::frontmatter::{self, find_entry_document, parse_frontmatter};

pub const MAX_SKILL_NAME_LENGTH: usize = 64;
pub const MAX_DESCRIPTION_LENGTH: usize = 1024;
pub const MAX_COMPATIBILITY_LENGTH: usize = 500;

pub const ALLOWED_FIELDS: &[&str] = &[
    "name",
    "description",
    "license",
    "allowed-tools",
    "metadata",
    "compatibility",
    "dependencies",
];

/// Validate a skill directory. An empty result means it passed.
pub fn validate(skill_dir: &Path) -> Vec<String> {
    if !skill_dir.exists() {
        return vec![format!("Path does not exist: {}", skill_dir.display())];
    }
    if !skill_dir.is_dir() {
        return vec![format!("Not a directory: {}", skill_dir.display())];
    }

    let Some(entry) = find_entry_document(skill_dir) else {
        return vec!["Missing required file: SKILL.md".to_string()];
    };

    let content = match std::fs::read_to_string(&entry) {
        Ok(content) => content,
        Err(e) => return vec![format!("Cannot read {}: {}", entry.display(), e)],
    };

    match parse_frontmatter(&content) {
        Ok((metadata, _)) => {
            let dir_name = skill_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned());
            validate_metadata(&metadata, dir_name.as_deref())
        }
        Err(e) => vec![e.to_string()],
    }
}

/// Validate parsed frontmatter, optionally against the enclosing directory name.
pub fn validate_metadata(metadata: &Mapping, dir_name: Option<&str>) -> Vec<String> {
    let mut errors = validate_fields(metadata);

    match metadata.get("name") {
        None => errors.push("Missing required field in frontmatter: name".to_string()),
        Some(value) => errors.extend(validate_name(value, dir_name)),
    }

    match metadata.get("description") {
        None => errors.push("Missing required field in frontmatter: description".to_string()),
        Some(value) => errors.extend(validate_description(value)),
    }

    if let Some(value) = metadata.get("compatibility") {
        errors.extend(validate_compatibility(value));
    }

    if metadata.contains_key("dependencies")
        && frontmatter::string_list(metadata, "dependencies").is_none()
    {
        errors.push("Field 'dependencies' must be a list of strings".to_string());
    }

    errors
}

fn validate_fields(metadata: &Mapping) -> Vec<String> {
    let mut extra: Vec<String> = metadata
        .keys()
        .map(|key| match key {
            Value::String(s) => s.clone(),
            other => serde_yaml::to_string(other)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
        })
        .filter(|key| !ALLOWED_FIELDS.contains(&key.as_str()))
        .collect();

    if extra.is_empty() {
        return Vec::new();
    }
    extra.sort();
    vec![format!(
        "Unexpected fields in frontmatter: {}. Only {} are allowed.",
        extra.join(", "),
        ALLOWED_FIELDS.join(", ")
    )]
}

fn validate_name(value: &Value, dir_name: Option<&str>) -> Vec<String> {
    let name = match value.as_str().map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => return vec!["Field 'name' must be a non-empty string".to_string()],
    };

    let mut errors = Vec::new();
    let length = name.chars().count();

    if length > MAX_SKILL_NAME_LENGTH {
        errors.push(format!(
            "Skill name '{}' exceeds {} character limit ({} chars)",
            name, MAX_SKILL_NAME_LENGTH, length
        ));
    }

    if name != name.to_lowercase() {
        errors.push(format!("Skill name '{}' must be lowercase", name));
    }

    if name.starts_with('-') || name.ends_with('-') {
        errors.push("Skill name cannot start or end with a hyphen".to_string());
    }

    if name.contains("--") {
        errors.push("Skill name cannot contain consecutive hyphens".to_string());
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c.is_ascii_uppercase())
    {
        errors.push(format!(
            "Skill name '{}' contains invalid characters. Only letters, digits, and hyphens are allowed.",
            name
        ));
    }

    if let Some(dir_name) = dir_name {
        if dir_name != name {
            errors.push(format!(
                "Directory name '{}' must match skill name '{}'",
                dir_name, name
            ));
        }
    }

    errors
}

fn validate_description(value: &Value) -> Vec<String> {
    let description = match value.as_str() {
        Some(d) if !d.trim().is_empty() => d,
        _ => return vec!["Field 'description' must be a non-empty string".to_string()],
    };

    let length = description.chars().count();
    if length > MAX_DESCRIPTION_LENGTH {
        return vec![format!(
            "Description exceeds {} character limit ({} chars)",
            MAX_DESCRIPTION_LENGTH, length
        )];
    }
    Vec::new()
}

fn validate_compatibility(value: &Value) -> Vec<String> {
    let Some(compatibility) = value.as_str() else {
        return vec!["Field 'compatibility' must be a string".to_string()];
    };

    let length = compatibility.chars().count();
    if length > MAX_COMPATIBILITY_LENGTH {
        return vec![format!(
            "Compatibility exceeds {} character limit ({} chars)",
            MAX_COMPATIBILITY_LENGTH, length
        )];
    }
    Vec::new()
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
