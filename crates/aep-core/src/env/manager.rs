//! Environment lifecycle manager.

use std::path::PathBuf;
use std::sync::Arc;

use aep_config::StoreLayout;
use aep_protocols::error::{EnvError, IoResultExt};
use aep_protocols::{Environment, EnvironmentPort, Scope};
use tracing::{debug, error, info};

use super::declaration::{Declaration, DeclarationSnapshot};

/// Creates, reuses and syncs one isolated environment per scope.
///
/// Not safe against two processes racing on the same scope: callers sharing
/// a store serialize registration and environment creation.
#[derive(Clone)]
pub struct LifecycleManager {
    layout: StoreLayout,
    port: Arc<dyn EnvironmentPort>,
}

impl LifecycleManager {
    pub fn new(layout: StoreLayout, port: Arc<dyn EnvironmentPort>) -> Self {
        Self { layout, port }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn port(&self) -> &Arc<dyn EnvironmentPort> {
        &self.port
    }

    /// The environment a scope maps to, whether or not it exists yet.
    pub fn environment(&self, scope: &Scope) -> Environment {
        self.layout.environment(scope)
    }

    /// Create the scope's environment if absent; otherwise return it untouched.
    pub async fn ensure(&self, scope: &Scope) -> Result<Environment, EnvError> {
        let env = self.environment(scope);
        if env.exists() {
            debug!("Environment for {} already exists at {:?}", scope, env.dir);
            return Ok(env);
        }

        std::fs::create_dir_all(&env.work_dir).at_path(&env.work_dir)?;
        info!("Creating environment for {} at {:?}", scope, env.dir);

        if let Err(e) = self.port.create(&env).await {
            error!("Environment creation for {} failed: {}", scope, e);
            if env.dir.exists() {
                let _ = std::fs::remove_dir_all(&env.dir);
            }
            return Err(e);
        }
        Ok(env)
    }

    /// Append requirements to the scope's declaration, skipping exact duplicates.
    ///
    /// Returns the declaration file location.
    pub fn declare<S: AsRef<str>>(
        &self,
        scope: &Scope,
        requirements: &[S],
    ) -> Result<PathBuf, EnvError> {
        let path = self.layout.declaration_path(scope);
        let mut declaration = Declaration::load(&path)?;
        let added = declaration.extend(requirements);
        if !added.is_empty() || !path.exists() {
            declaration.save(&path)?;
        }
        debug!("Declared {:?} for {}", added, scope);
        Ok(path)
    }

    /// Rewrite the scope's declaration wholesale.
    pub fn replace<S: AsRef<str>>(
        &self,
        scope: &Scope,
        requirements: &[S],
    ) -> Result<PathBuf, EnvError> {
        let path = self.layout.declaration_path(scope);
        Declaration::from_requirements(requirements).save(&path)?;
        info!("Replaced declaration for {}", scope);
        Ok(path)
    }

    pub fn read_declaration(&self, scope: &Scope) -> Result<Vec<String>, EnvError> {
        let declaration = Declaration::load(&self.layout.declaration_path(scope))?;
        Ok(declaration.requirements().to_vec())
    }

    pub fn snapshot(&self, scope: &Scope) -> Result<DeclarationSnapshot, EnvError> {
        Ok(DeclarationSnapshot::capture(
            &self.layout.declaration_path(scope),
        )?)
    }

    /// Install the full current declaration, creating the environment first if needed.
    pub async fn sync(&self, scope: &Scope) -> Result<Environment, EnvError> {
        let env = self.ensure(scope).await?;
        let declaration = Declaration::load(&self.layout.declaration_path(scope))?;
        if declaration.is_empty() {
            debug!("Nothing declared for {}", scope);
            return Ok(env);
        }

        info!(
            "Installing {} requirement(s) into {}",
            declaration.requirements().len(),
            scope
        );
        if let Err(e) = self.port.install(&env, declaration.requirements()).await {
            error!("Dependency install for {} failed: {}", scope, e);
            return Err(e);
        }
        Ok(env)
    }

    /// Declare then sync; the declaration is restored if the sync fails.
    pub async fn declare_and_sync<S: AsRef<str>>(
        &self,
        scope: &Scope,
        requirements: &[S],
    ) -> Result<Environment, EnvError> {
        let snapshot = self.snapshot(scope)?;
        self.declare(scope, requirements)?;
        match self.sync(scope).await {
            Ok(env) => Ok(env),
            Err(e) => {
                snapshot.restore()?;
                Err(e)
            }
        }
    }

    /// Delete the scope's backing directory. Returns whether it existed.
    pub fn discard(&self, scope: &Scope) -> Result<bool, EnvError> {
        let env = self.environment(scope);
        if !env.dir.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&env.dir).at_path(&env.dir)?;
        info!("Discarded environment for {}", scope);
        Ok(true)
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
