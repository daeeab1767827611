//! # AEP Config
//!
//! Settings loading and the on-disk layout of a capability store.

mod error;
mod layout;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use layout::StoreLayout;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{Issue, SettingsValidator, ValidationResult};
