//! # AEP Core
//!
//! Environment lifecycle and capability registration for an AEP store.
//!
//! ## Components
//!
//! - [`LifecycleManager`] - one isolated environment per scope, declared
//!   dependencies, idempotent `ensure`
//! - [`UvPort`] - the [`EnvironmentPort`](aep_protocols::EnvironmentPort)
//!   backed by the `uv` installer
//! - [`StagedBundle`] - rollback guard for a freshly copied capability
//! - [`validator`] - skill entry document checks
//! - Registries for tools, skills and library documents

pub mod env;
pub mod frontmatter;
pub mod index;
pub mod registry;
pub mod staging;
pub mod validator;

pub use env::{Declaration, DeclarationSnapshot, LifecycleManager, UvPort};
pub use registry::{LibraryRegistry, SkillRegistry, ToolRegistry};
pub use staging::StagedBundle;
