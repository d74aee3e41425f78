//! Configuration schema definitions.
//!
//! This module defines the configuration structure for fuses and the
//! simulation harness. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

/// Upper bound of `error_rate`, in hundredths of a percent (100.00%).
pub const ERROR_RATE_SCALE: i64 = 10_000;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PolyfuseConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Fuse definitions, one breaker per entry.
    pub fuses: Vec<FuseSettings>,
}

/// Settings for a single fuse.
///
/// Immutable once a breaker has been built from them. Limits that are `<= 0`
/// disable the corresponding trip condition.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FuseSettings {
    /// Fuse identifier for logging/metrics.
    pub id: String,

    /// Window in seconds over which `max_request` and `max_error` apply.
    pub timeframe_secs: i64,

    /// Maximum decayed request count before tripping.
    pub max_request: i64,

    /// Maximum decayed error count before tripping.
    pub max_error: i64,

    /// Error rate before tripping, per 10000 (100.00% precision).
    pub error_rate: i64,

    /// Ramp-up window in seconds. A snapshot younger than this has its
    /// error rate check relaxed toward 100%. Recommended 4s-10s, min 1s.
    pub ramp_secs: i64,

    /// Safe concurrent updates across instances. Not supported yet.
    pub multi_lock: bool,
}

impl Default for FuseSettings {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            timeframe_secs: 10,
            max_request: 0,
            max_error: 0,
            error_rate: 0,
            ramp_secs: 5,
            multi_lock: false,
        }
    }
}

impl FuseSettings {
    /// Create settings with the given id and defaults elsewhere.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Clamp `error_rate` into `[0, 10000]` and `ramp_secs` to at least 1.
    pub fn normalized(mut self) -> Self {
        self.error_rate = self.error_rate.clamp(0, ERROR_RATE_SCALE);
        self.ramp_secs = self.ramp_secs.max(1);
        self
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
