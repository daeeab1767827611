//! Error types for the AEP capability subsystem.

mod environment;
mod registry;
mod storage;

pub use environment::*;
pub use registry::*;
pub use storage::*;
