//! CLI definitions for AEP.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// AEP CLI.
#[derive(Parser)]
#[command(name = "aep")]
#[command(about = "Isolated tools, skills and MCP servers behind one command surface")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ./aep.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Capability store directory
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Create the store and prepare the shared tools environment
    Init {
        /// Extra tool dependencies
        #[arg(long = "dep", value_name = "REQ")]
        deps: Vec<String>,

        /// Skip the configured default tool dependencies
        #[arg(long)]
        no_defaults: bool,
    },

    /// Re-render the tools, skills and library indexes
    Index,

    /// Tool management commands
    Tool {
        #[command(subcommand)]
        action: ToolAction,
    },

    /// Skill management commands
    Skill {
        #[command(subcommand)]
        action: SkillAction,
    },

    /// Library document commands
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },

    /// Remote MCP server commands
    Mcp {
        #[command(subcommand)]
        action: McpAction,
    },

    /// Run one command line through a session
    Exec {
        /// The command line, e.g. `tools run "1 + 1"`
        line: String,

        #[command(flatten)]
        workspace: WorkspaceArg,
    },

    /// Read command lines from stdin, one session for all of them
    Shell {
        #[command(flatten)]
        workspace: WorkspaceArg,
    },
}

#[derive(Args)]
pub(crate) struct WorkspaceArg {
    /// Workspace directory (default: current directory)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct DepsArg {
    /// Dependency to declare (repeatable)
    #[arg(long = "dep", value_name = "REQ")]
    pub deps: Vec<String>,
}

#[derive(Subcommand)]
pub(crate) enum ToolAction {
    /// Copy a Python module into the store
    Add {
        source: PathBuf,

        /// Tool name (default: file stem)
        #[arg(short, long)]
        name: Option<String>,

        #[command(flatten)]
        deps: DepsArg,
    },

    /// Remove a tool
    Remove { name: String },

    /// List tools in registration order
    List,

    /// Show a tool's documentation
    Info { name: String },

    /// Show the shared dependency declaration, or add to it
    Deps {
        /// Requirements to add and install
        packages: Vec<String>,
    },

    /// Install the full declaration into the tools environment
    Sync,
}

#[derive(Subcommand)]
pub(crate) enum SkillAction {
    /// Register a skill directory or a single SKILL.md document
    Add {
        source: PathBuf,

        /// Skill name (default: directory name or header name)
        #[arg(short, long)]
        name: Option<String>,

        #[command(flatten)]
        deps: DepsArg,
    },

    /// Remove a skill and its environment
    Remove { name: String },

    /// List skills in registration order
    List,

    /// Show a skill's entry document
    Info { name: String },

    /// Re-install a skill's declared dependencies
    Sync { name: String },
}

#[derive(Subcommand)]
pub(crate) enum LibraryAction {
    /// Copy a reference document into the store
    Add {
        source: PathBuf,

        /// Document name (default: file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Remove a document
    Remove { name: String },

    /// List documents
    List,
}

#[derive(Subcommand)]
pub(crate) enum McpAction {
    /// Connect to a server, discover its functions and generate a tool stub
    Add {
        /// Server name, used as the tools module name
        name: String,

        /// stdio or http
        #[arg(short, long, default_value = "stdio")]
        transport: String,

        /// Launch command (stdio)
        #[arg(long)]
        command: Option<String>,

        /// Endpoint URL (http)
        #[arg(long)]
        url: Option<String>,

        /// Environment variable for the server process (stdio), KEY=VALUE
        #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_pair)]
        env: Vec<(String, String)>,

        /// Request header (http), KEY=VALUE
        #[arg(long = "header", value_name = "KEY=VALUE", value_parser = parse_pair)]
        headers: Vec<(String, String)>,

        #[command(flatten)]
        deps: DepsArg,

        /// Arguments for the launch command (after `--`)
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Re-discover a server's functions and regenerate its stub
    Refresh { name: String },

    /// Remove a server's config and stub
    Remove { name: String },

    /// List configured servers
    List,

    /// Print a server's stored config
    Show { name: String },

    /// Call one remote function and print its text result
    Call {
        server: String,
        function: String,

        /// JSON object of arguments
        #[arg(default_value = "{}")]
        arguments: String,
    },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}
