//! Structural validation of a loaded configuration

use thiserror::Error;

use super::{AccountRole, TestConfig};
use crate::utils::logger::LogLevel;

/// A single violated configuration invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("port must be a positive integer")]
    InvalidPort,

    #[error("url_base must start with '/': {0}")]
    InvalidUrlBase(String),

    #[error("irods_zone must not be empty")]
    EmptyZone,

    #[error("{role}.username must not be empty")]
    EmptyUsername { role: AccountRole },

    #[error("{role}.password must not be empty")]
    EmptyPassword { role: AccountRole },

    #[error("unknown log_level: {0}")]
    UnknownLogLevel(String),
}

/// Collect every violation, in field order
pub(super) fn check(config: &TestConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    if config.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }

    if !config.url_base.starts_with('/') {
        errors.push(ValidationError::InvalidUrlBase(config.url_base.clone()));
    }

    for role in AccountRole::all() {
        let credentials = config.credentials(role);
        if credentials.username.is_empty() {
            errors.push(ValidationError::EmptyUsername { role });
        }
        if credentials.password.is_empty() {
            errors.push(ValidationError::EmptyPassword { role });
        }
    }

    if config.irods_zone.trim().is_empty() {
        errors.push(ValidationError::EmptyZone);
    }

    if let Some(level) = &config.log_level {
        if LogLevel::from_str(level).is_none() {
            errors.push(ValidationError::UnknownLogLevel(level.clone()));
        }
    }

    errors
}
