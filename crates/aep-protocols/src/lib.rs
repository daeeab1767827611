//! # AEP Protocols
//!
//! Vocabulary shared by every AEP crate: the capability data model, the
//! outcome of a routed command, the error taxonomy, and the
//! [`EnvironmentPort`](environment::EnvironmentPort) trait behind which the
//! isolated-runtime tooling lives.

pub mod capability;
pub mod environment;
pub mod error;
pub mod exec;

pub use capability::{CapabilityKind, CapabilityRecord, RemoteOrigin};
pub use environment::{Environment, EnvironmentPort, Scope};
pub use exec::ExecOutcome;
