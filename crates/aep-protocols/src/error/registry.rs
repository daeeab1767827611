//! Capability registry errors.

use thiserror::Error;

use super::{EnvError, StorageError};
use crate::capability::CapabilityKind;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Name conflict: {0}")]
    NameConflict(String),

    #[error("Invalid {kind} name '{name}': {reason}")]
    InvalidName {
        kind: CapabilityKind,
        name: String,
        reason: String,
    },

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Skill '{name}' failed validation: {}", errors.join("; "))]
    Validation { name: String, errors: Vec<String> },

    #[error("Unknown {kind}: {name}")]
    UnknownCapability { kind: CapabilityKind, name: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Environment(#[from] EnvError),
}

impl RegistryError {
    pub fn unknown(kind: CapabilityKind, name: impl Into<String>) -> Self {
        Self::UnknownCapability {
            kind,
            name: name.into(),
        }
    }
}
