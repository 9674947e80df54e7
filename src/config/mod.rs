//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, CommandsConfig, MarshalConfig)
//! - [`identity`]: Static identity table (IdentityEntry)
//! - [`defaults`]: Serde default value functions
//! - [`validation`]: Startup validation

mod defaults;
mod identity;
mod types;
mod validation;

pub use identity::IdentityEntry;
pub use types::{CommandsConfig, Config, ConfigError, MarshalConfig, ServerConfig};
pub use validation::{ValidationError, validate};
