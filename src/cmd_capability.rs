//! Store management commands: init, index, tool, skill and library.

use anyhow::{Context, bail};

use aep_runtime::CapabilityStore;

use crate::cli::{LibraryAction, SkillAction, ToolAction};

pub(crate) async fn init(
    store: &CapabilityStore,
    deps: &[String],
    include_defaults: bool,
) -> anyhow::Result<()> {
    let env = store
        .init_tool_environment(deps, include_defaults)
        .await
        .context("failed to prepare the tools environment")?;
    println!("Store ready at {}", store.root().display());
    println!("Tools environment: {}", env.dir.display());
    Ok(())
}

pub(crate) fn index(store: &CapabilityStore) -> anyhow::Result<()> {
    for path in store.index()? {
        println!("{}", path.display());
    }
    Ok(())
}

fn print_names(names: &[String], empty: &str) {
    if names.is_empty() {
        println!("{}", empty);
    }
    for name in names {
        println!("{}", name);
    }
}

pub(crate) async fn tool(store: &CapabilityStore, action: ToolAction) -> anyhow::Result<()> {
    let tools = store.tools();
    match action {
        ToolAction::Add { source, name, deps } => {
            let path = tools.add(&source, name.as_deref(), &deps.deps).await?;
            println!("Added tool {}", path.display());
        }
        ToolAction::Remove { name } => {
            if !tools.remove(&name)? {
                bail!("tool '{}' not found", name);
            }
            println!("Removed tool {}", name);
        }
        ToolAction::List => print_names(&tools.list()?, "No tools registered."),
        ToolAction::Info { name } => match tools.info(&name)? {
            Some(doc) => print!("{}", doc),
            None => bail!("tool '{}' not found", name),
        },
        ToolAction::Deps { packages } => {
            if !packages.is_empty() {
                tools.add_dependencies(&packages).await?;
            }
            print_names(&tools.dependencies()?, "No tool dependencies declared.");
        }
        ToolAction::Sync => {
            tools.sync_dependencies().await?;
            println!("Tools environment synced");
        }
    }
    Ok(())
}

pub(crate) async fn skill(store: &CapabilityStore, action: SkillAction) -> anyhow::Result<()> {
    let skills = store.skills();
    match action {
        SkillAction::Add { source, name, deps } => {
            let deps = (!deps.deps.is_empty()).then_some(deps.deps.as_slice());
            let path = skills.add(&source, name.as_deref(), deps).await?;
            println!("Added skill {}", path.display());
        }
        SkillAction::Remove { name } => {
            if !skills.remove(&name)? {
                bail!("skill '{}' not found", name);
            }
            println!("Removed skill {}", name);
        }
        SkillAction::List => print_names(&skills.list()?, "No skills registered."),
        SkillAction::Info { name } => match skills.info(&name)? {
            Some(doc) => print!("{}", doc),
            None => bail!("skill '{}' not found", name),
        },
        SkillAction::Sync { name } => {
            skills.sync_dependencies(&name).await?;
            println!("Skill {} synced", name);
        }
    }
    Ok(())
}

pub(crate) fn library(store: &CapabilityStore, action: LibraryAction) -> anyhow::Result<()> {
    let library = store.library();
    match action {
        LibraryAction::Add { source, name } => {
            let path = library.add(&source, name.as_deref())?;
            println!("Added document {}", path.display());
        }
        LibraryAction::Remove { name } => {
            if !library.remove(&name)? {
                bail!("document '{}' not found", name);
            }
            println!("Removed document {}", name);
        }
        LibraryAction::List => print_names(&library.list()?, "No documents in the library."),
    }
    Ok(())
}
