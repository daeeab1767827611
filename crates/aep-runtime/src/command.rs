//! The router's command grammar.
//!
//! ```text
//! tools list | tools info <name> | tools run <quoted code>
//! skills list | skills info <name> | skills run <skill>/<script> [args...]
//! cd [path] | export [KEY=VALUE ...]
//! <anything else>                  (shell passthrough)
//! ```

use thiserror::Error;

pub const TOOLS_USAGE: &str = "Usage: tools <list|info|run> [args]
  tools list             list registered tools
  tools info <name>      show a tool's documentation
  tools run \"<code>\"     run Python code with every tool bound under `tools`";

pub const SKILLS_USAGE: &str = "Usage: skills <list|info|run> [args]
  skills list                       list registered skills
  skills info <name>                show a skill's entry document
  skills run <skill>/<script> [args] run a skill script";

const TOOLS_RUN_USAGE: &str =
    "Usage: tools run \"<code>\" (code must be wrapped in \", ', \"\"\" or ''')";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Cannot parse command: unbalanced quotes")]
    UnbalancedQuotes,

    #[error("{0}")]
    Usage(String),
}

impl ParseError {
    fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }
}

/// One parsed line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    ToolsList,
    ToolsInfo(String),
    ToolsRun(String),
    SkillsList,
    SkillsInfo(String),
    SkillsRun { path: String, args: Vec<String> },
    Cd(Option<String>),
    /// No pairs lists the session's variables.
    Export(Vec<(String, String)>),
    Shell(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Command::Empty);
        }

        // Before tokenising, so embedded newlines survive.
        if let Some(rest) = strip_keyword(line, "tools run") {
            return parse_tools_run(rest);
        }

        let parts = shlex::split(line).ok_or(ParseError::UnbalancedQuotes)?;
        let Some((head, args)) = parts.split_first() else {
            return Ok(Command::Empty);
        };

        match head.as_str() {
            "tools" => parse_tools(args),
            "skills" => parse_skills(args),
            "cd" => Ok(Command::Cd(args.first().cloned())),
            "export" => parse_export(args),
            _ => Ok(Command::Shell(line.to_string())),
        }
    }
}

/// `line` minus `keyword`, if `keyword` is followed by whitespace or the end.
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let (first, rest) = keyword.split_once(' ')?;
    let after_first = line.strip_prefix(first)?;
    let trimmed = after_first.trim_start_matches([' ', '\t']);
    if trimmed.len() == after_first.len() {
        return None;
    }
    let after = trimmed.strip_prefix(rest)?;
    match after.chars().next() {
        None => Some(after),
        Some(c) if c.is_whitespace() => Some(after),
        _ => None,
    }
}

fn parse_tools_run(rest: &str) -> Result<Command, ParseError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Err(ParseError::usage(TOOLS_RUN_USAGE));
    }
    extract_quoted(rest)
        .map(|code| Command::ToolsRun(code.to_string()))
        .ok_or_else(|| ParseError::usage(TOOLS_RUN_USAGE))
}

/// Strip one layer of `"""`, `'''`, `"` or `'` quoting.
pub fn extract_quoted(s: &str) -> Option<&str> {
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if s.len() >= quote.len() * 2 && s.starts_with(quote) && s.ends_with(quote) {
            return Some(&s[quote.len()..s.len() - quote.len()]);
        }
    }
    None
}

fn parse_tools(args: &[String]) -> Result<Command, ParseError> {
    match args.first().map(String::as_str) {
        None => Err(ParseError::usage(TOOLS_USAGE)),
        Some("list") => Ok(Command::ToolsList),
        Some("info") => args
            .get(1)
            .map(|name| Command::ToolsInfo(name.clone()))
            .ok_or_else(|| ParseError::usage("Usage: tools info <name>")),
        Some("run") => Err(ParseError::usage(TOOLS_RUN_USAGE)),
        Some(other) => Err(ParseError::usage(format!(
            "Unknown subcommand: tools {}\n{}",
            other, TOOLS_USAGE
        ))),
    }
}

fn parse_skills(args: &[String]) -> Result<Command, ParseError> {
    match args.first().map(String::as_str) {
        None => Err(ParseError::usage(SKILLS_USAGE)),
        Some("list") => Ok(Command::SkillsList),
        Some("info") => args
            .get(1)
            .map(|name| Command::SkillsInfo(name.clone()))
            .ok_or_else(|| ParseError::usage("Usage: skills info <name>")),
        Some("run") => match args.get(1) {
            Some(path) => Ok(Command::SkillsRun {
                path: path.clone(),
                args: args[2..].to_vec(),
            }),
            None => Err(ParseError::usage(
                "Usage: skills run <skill>/<script> [args]",
            )),
        },
        Some(other) => Err(ParseError::usage(format!(
            "Unknown subcommand: skills {}\n{}",
            other, SKILLS_USAGE
        ))),
    }
}

fn parse_export(args: &[String]) -> Result<Command, ParseError> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(ParseError::usage(format!(
                "Invalid export '{}', expected KEY=VALUE",
                arg
            ))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Command::Export)
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
