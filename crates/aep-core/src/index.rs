//! Markdown discovery indexes (`<kind>/index.md`).

/// One `- label: description` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLine {
    pub label: String,
    pub description: String,
}

impl IndexLine {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
        }
    }
}

/// Render an index with a `# title` header, one line per entry, and an
/// optional usage footer. Empty indexes carry a `_none_` placeholder.
pub fn render_index(title: &str, intro: &str, lines: &[IndexLine], footer: Option<&str>) -> String {
    let mut content = format!("# {}\n\n", title);
    if lines.is_empty() {
        content.push_str("_none_\n");
        return content;
    }

    content.push_str(intro);
    content.push_str("\n\n");
    for line in lines {
        content.push_str(&format!("- {}: {}\n", line.label, line.description));
    }
    if let Some(footer) = footer {
        content.push('\n');
        content.push_str(footer);
        content.push('\n');
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_index() {
        assert_eq!(render_index("Tools", "Available tools:", &[], None), "# Tools\n\n_none_\n");
    }

    #[test]
    fn test_lines_and_footer() {
        let content = render_index(
            "Skills",
            "Available skills:",
            &[IndexLine::new("`pdf` (`pdf/`)", "Read PDFs")],
            Some("Run with `skills run <name>/<script> [args]`"),
        );
        assert!(content.starts_with("# Skills\n\nAvailable skills:\n\n"));
        assert!(content.contains("- `pdf` (`pdf/`): Read PDFs\n"));
        assert!(content.ends_with("[args]`\n"));
    }
}
