//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that `default_config` names a defined configuration
//! - Validate value ranges (timeouts > 0) for the whole file
//! - Validate the backend URL and port of the configuration being run
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Named configurations other than the selected one are never checked

use thiserror::Error;

use crate::backend::BackendTarget;
use crate::config::schema::{ProxyConfig, SiteConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("default_config '{0}' is not defined")]
    UnknownDefault(String),

    #[error("configs.{name}: {reason}")]
    BadBackend { name: String, reason: String },

    #[error("configs.{0}: proxy_port must not be 0")]
    ZeroPort(String),

    #[error("timeouts.{0} must be greater than 0")]
    ZeroTimeout(&'static str),
}

/// Check the file-wide settings, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(default) = &config.default_config {
        if !config.configs.contains_key(default) {
            errors.push(ValidationError::UnknownDefault(default.clone()));
        }
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("connect_secs", timeouts.connect_secs),
        ("backend_secs", timeouts.backend_secs),
        ("request_secs", timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(field));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check one named configuration before it is run.
pub fn validate_site(name: &str, site: &SiteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = BackendTarget::parse(&site.bugzilla_url) {
        errors.push(ValidationError::BadBackend {
            name: name.to_string(),
            reason: e.to_string(),
        });
    }
    if site.proxy_port == 0 {
        errors.push(ValidationError::ZeroPort(name.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
