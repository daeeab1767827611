//! # AEP Runtime
//!
//! Routes one line of agent input to the right backend.
//!
//! - [`CapabilityStore`] - the registries, environments and remote adapter of one store
//! - [`Command`] - the parsed command grammar
//! - [`Session`] - sequential `exec` with session-local `cd`/`export` state

pub mod command;
pub mod error;
pub mod executor;
pub mod session;
pub mod shell;
pub mod store;

#[cfg(test)]
mod fake_port;

pub use command::Command;
pub use error::ExecError;
pub use session::Session;
pub use store::CapabilityStore;
