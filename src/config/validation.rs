//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::collections::HashSet;
use thiserror::Error;

/// Longest command deadline accepted from config: one day.
pub const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("commands.prefix must be a visible character, got {0:?}")]
    InvalidPrefix(char),
    #[error("commands.blocking_timeout_secs must be greater than zero")]
    ZeroBlockingTimeout,
    #[error("commands.quick_timeout_secs must be greater than zero")]
    ZeroQuickTimeout,
    #[error("commands.{field} must be at most {max}, got {secs}", max = MAX_TIMEOUT_SECS)]
    TimeoutTooLarge { field: &'static str, secs: u64 },
    #[error("identity id {0} is listed more than once")]
    DuplicateIdentity(u64),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    let prefix = config.commands.prefix;
    if prefix.is_whitespace() || prefix.is_control() || prefix == '"' {
        errors.push(ValidationError::InvalidPrefix(prefix));
    }

    if config.commands.blocking_timeout_secs == 0 {
        errors.push(ValidationError::ZeroBlockingTimeout);
    }
    if config.commands.quick_timeout_secs == 0 {
        errors.push(ValidationError::ZeroQuickTimeout);
    }
    for (field, secs) in [
        ("blocking_timeout_secs", config.commands.blocking_timeout_secs),
        ("quick_timeout_secs", config.commands.quick_timeout_secs),
    ] {
        if secs > MAX_TIMEOUT_SECS {
            errors.push(ValidationError::TimeoutTooLarge { field, secs });
        }
    }

    let mut seen = HashSet::new();
    for entry in &config.identity {
        if !seen.insert(entry.id) {
            errors.push(ValidationError::DuplicateIdentity(entry.id));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let config: Config = toml::from_str(
            r#"
[commands]
prefix = " "
blocking_timeout_secs = 0

[[identity]]
id = 1
name = "a"

[[identity]]
id = 1
name = "b"
"#,
        )
        .unwrap();

        let errors = validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidPrefix(' '),
                ValidationError::ZeroBlockingTimeout,
                ValidationError::DuplicateIdentity(1),
            ]
        );
    }

    #[test]
    fn test_rejects_unbounded_timeout() {
        let config: Config = toml::from_str(
            r#"
[commands]
blocking_timeout_secs = 9223372036854775807
"#,
        )
        .unwrap();

        let errors = validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::TimeoutTooLarge {
                field: "blocking_timeout_secs",
                secs: 9_223_372_036_854_775_807,
            }]
        );

        let mut config = Config::default();
        config.commands.quick_timeout_secs = MAX_TIMEOUT_SECS;
        assert!(validate(&config).is_ok());
    }
}
