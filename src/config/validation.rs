//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::state::managers::moderation::MAX_MUTE_SECS;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("server.admin_username is required")]
    MissingAdminUsername,
    #[error("server.admin_username must not contain whitespace, got '{0}'")]
    InvalidAdminUsername(String),
    #[error("limits.max_line_length must be at least 16, got {0}")]
    LineLengthTooSmall(usize),
    #[error("limits.outbound_queue must be at least 1")]
    ZeroOutboundQueue,
    #[error("limits.max_mute_seconds must be between 1 and {MAX_MUTE_SECS}, got {0}")]
    InvalidMuteCeiling(u64),
    #[error("logging.activity_log parent directory does not exist: {0}")]
    ActivityLogPathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Required fields
    if config.server.name.trim().is_empty() {
        errors.push(ValidationError::MissingServerName);
    }
    let admin = &config.server.admin_username;
    if admin.is_empty() {
        errors.push(ValidationError::MissingAdminUsername);
    } else if admin.chars().any(char::is_whitespace) {
        errors.push(ValidationError::InvalidAdminUsername(admin.clone()));
    }

    // Limits
    if config.limits.max_line_length < 16 {
        errors.push(ValidationError::LineLengthTooSmall(
            config.limits.max_line_length,
        ));
    }
    if config.limits.outbound_queue == 0 {
        errors.push(ValidationError::ZeroOutboundQueue);
    }
    if !(1..=MAX_MUTE_SECS).contains(&config.limits.max_mute_seconds) {
        errors.push(ValidationError::InvalidMuteCeiling(
            config.limits.max_mute_seconds,
        ));
    }

    // Activity log path
    if let Some(path) = config.logging.activity_log_path()
        && let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        errors.push(ValidationError::ActivityLogPathInvalid(path.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
