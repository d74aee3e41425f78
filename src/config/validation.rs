//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that would make a fuse
//! misbehave. Every check runs and all errors are returned, not just the
//! first.

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::{FuseSettings, PolyfuseConfig};

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Fuse the problem belongs to, if any.
    pub fuse: Option<String>,
    /// Offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(fuse: &str, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            fuse: Some(fuse.to_string()),
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fuse {
            Some(id) => write!(f, "fuse '{}': {} {}", id, self.field, self.message),
            None => write!(f, "{} {}", self.field, self.message),
        }
    }
}

/// Render a list of errors on one line.
pub(crate) fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate a single fuse's settings.
pub fn validate_settings(settings: &FuseSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let id = settings.id.as_str();

    if id.trim().is_empty() {
        errors.push(ValidationError::new(id, "id", "must not be empty"));
    }

    // A zero or negative window would turn the decay rates into Inf/NaN.
    if settings.timeframe_secs <= 0 {
        errors.push(ValidationError::new(
            id,
            "timeframe_secs",
            format!("must be > 0, got {}", settings.timeframe_secs),
        ));
    }

    if settings.multi_lock {
        errors.push(ValidationError::new(
            id,
            "multi_lock",
            "is not supported yet",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the whole configuration.
pub fn validate_config(config: &PolyfuseConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for settings in &config.fuses {
        if let Err(mut fuse_errors) = validate_settings(settings) {
            errors.append(&mut fuse_errors);
        }
        if !seen.insert(settings.id.as_str()) {
            errors.push(ValidationError::new(&settings.id, "id", "is duplicated"));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError {
            fuse: None,
            field: "observability.metrics_address",
            message: format!(
                "is not a socket address: {}",
                config.observability.metrics_address
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
