//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs after environment overrides, before config is accepted

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.port must be non-zero")]
    ZeroPort,

    #[error("server.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("server.max_connections must be greater than zero")]
    ZeroMaxConnections,

    #[error("admin.api_key must be set when admin is enabled")]
    MissingAdminKey,
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let server = &config.server;

    if server.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    for (name, value) in [
        ("read_timeout", server.read_timeout),
        ("write_timeout", server.write_timeout),
        ("graceful_timeout", server.graceful_timeout),
    ] {
        if value.is_zero() {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }
    if server.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }
    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::MissingAdminKey);
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
    use std::time::Duration;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_problem() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.server.write_timeout = Duration::ZERO;
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroPort,
                ValidationError::ZeroTimeout("write_timeout"),
                ValidationError::MissingAdminKey,
            ]
        );
    }
}
