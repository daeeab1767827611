//! Remote MCP server commands.

use std::collections::BTreeMap;
use std::process::ExitCode;

use anyhow::{Context, bail};

use aep_mcp_bridge::TransportSpec;
use aep_runtime::CapabilityStore;

use crate::cli::McpAction;

pub(crate) async fn run(store: &CapabilityStore, action: McpAction) -> anyhow::Result<ExitCode> {
    let remote = store.remote();
    match action {
        McpAction::Add {
            name,
            transport,
            command,
            url,
            env,
            headers,
            deps,
            args,
        } => {
            // stdio takes --env, http takes --header; the other kind must be empty
            let pairs = match transport.as_str() {
                "http" if !env.is_empty() => bail!("--env is only valid for stdio servers"),
                "http" => headers,
                _ if !headers.is_empty() => bail!("--header is only valid for http servers"),
                _ => env,
            };
            let spec = TransportSpec::from_parts(
                &transport,
                command.as_deref(),
                &args,
                url.as_deref(),
                pairs.into_iter().collect::<BTreeMap<_, _>>(),
            )?;
            let path = remote.add(&name, spec, &deps.deps).await?;
            println!("Added MCP server {} as tool {}", name, path.display());
        }
        McpAction::Refresh { name } => {
            let path = remote.refresh(&name).await?;
            println!("Refreshed {}", path.display());
        }
        McpAction::Remove { name } => {
            if !remote.remove(&name)? {
                bail!("MCP server '{}' not found", name);
            }
            println!("Removed MCP server {}", name);
        }
        McpAction::List => {
            let names = remote.list()?;
            if names.is_empty() {
                println!("No MCP servers configured.");
            }
            for name in names {
                println!("{}", name);
            }
        }
        McpAction::Show { name } => match remote.get_config(&name)? {
            Some(config) => println!("{}", serde_json::to_string_pretty(&config)?),
            None => bail!("MCP server '{}' not found", name),
        },
        McpAction::Call {
            server,
            function,
            arguments,
        } => {
            let arguments: serde_json::Value = serde_json::from_str(&arguments)
                .context("arguments must be a JSON object")?;
            // Stubs read stdout verbatim, so failures only go to stderr
            match remote.invoke(&server, &function, arguments).await {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("{}", e);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
