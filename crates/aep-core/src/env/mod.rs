//! Isolated environments: declaration files, lifecycle, and the `uv` port.

mod declaration;
mod manager;
mod uv;

#[cfg(test)]
pub(crate) mod fake_port;

pub use declaration::{Declaration, DeclarationSnapshot};
pub use manager::LifecycleManager;
pub use uv::UvPort;
