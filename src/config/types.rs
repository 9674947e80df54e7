//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;
use super::identity::IdentityEntry;
use super::validation::{ValidationError, validate};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server identity.
    #[serde(default)]
    pub server: ServerConfig,
    /// Command parsing and dispatch settings.
    #[serde(default)]
    pub commands: CommandsConfig,
    /// Owner-thread settings.
    #[serde(default)]
    pub marshal: MarshalConfig,
    /// Known callers, used by the console host's identity table.
    #[serde(default)]
    pub identity: Vec<IdentityEntry>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load and validate, reporting every problem at once.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        validate(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name shown in logs and `ver`.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Version reported by `ver` (default: this crate's version).
    #[serde(default = "default_server_version")]
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            version: default_server_version(),
        }
    }
}

/// Command dispatch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandsConfig {
    /// Character that marks a chat message as a command (default: `!`).
    #[serde(default = "default_prefix")]
    pub prefix: char,

    /// Seconds a server-originated command may block its caller (default: 60).
    #[serde(default = "default_blocking_timeout")]
    pub blocking_timeout_secs: u64,

    /// Seconds for quick status queries (default: 5).
    #[serde(default = "default_quick_timeout")]
    pub quick_timeout_secs: u64,
}

impl CommandsConfig {
    pub fn blocking_timeout(&self) -> Duration {
        Duration::from_secs(self.blocking_timeout_secs)
    }

    pub fn quick_timeout(&self) -> Duration {
        Duration::from_secs(self.quick_timeout_secs)
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            blocking_timeout_secs: default_blocking_timeout(),
            quick_timeout_secs: default_quick_timeout(),
        }
    }
}

/// Owner-thread configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MarshalConfig {
    /// Name of the owner thread (default: "owner").
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

impl Default for MarshalConfig {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
        }
    }
}
