//! Fuse state and error definitions.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::validation::{join_errors, ValidationError};

/// Persisted state of one fuse.
///
/// Both counters are decayed estimates and never negative. `error_count` may
/// exceed `request_count` for a short while; nothing enforces an ordering
/// between them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Decayed count of recent requests.
    #[serde(rename = "request")]
    pub request_count: f64,
    /// Decayed count of recent failed requests.
    #[serde(rename = "error")]
    pub error_count: f64,
    /// When the snapshot was last computed.
    pub timestamp: SystemTime,
}

impl Snapshot {
    /// Seed value stored when a breaker is built.
    pub fn initial(now: SystemTime) -> Self {
        Self {
            request_count: 1.0,
            error_count: 0.0,
            timestamp: now,
        }
    }
}

/// Why a decision denied the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripReason {
    /// Decayed request count reached `max_request`.
    RequestCeiling,
    /// Decayed error count reached `max_error`.
    ErrorCeiling,
    /// Error ratio exceeded the ramp-adjusted `error_rate`.
    ErrorRate,
}

impl TripReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripReason::RequestCeiling => "request_ceiling",
            TripReason::ErrorCeiling => "error_ceiling",
            TripReason::ErrorRate => "error_rate",
        }
    }
}

/// Outcome of a decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Caller may proceed. Carries the decayed snapshot to persist.
    Allow(Snapshot),
    /// Caller must not proceed.
    Trip(TripReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }
}

/// Errors that can occur while operating a fuse.
#[derive(Debug, Error)]
pub enum FuseError {
    /// The snapshot store could not be read or written.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Settings were rejected when building the fuse.
    #[error("Invalid fuse settings: {}", join_errors(.0))]
    InvalidSettings(Vec<ValidationError>),
}

/// Result type for fuse operations.
pub type FuseResult<T> = Result<T, FuseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_initial_snapshot() {
        let now = UNIX_EPOCH + Duration::from_secs(1_000);
        let snapshot = Snapshot::initial(now);
        assert_eq!(snapshot.request_count, 1.0);
        assert_eq!(snapshot.error_count, 0.0);
        assert_eq!(snapshot.timestamp, now);
    }

    #[test]
    fn test_snapshot_json_field_names() {
        let snapshot = Snapshot::initial(UNIX_EPOCH);
        let value = serde_json::to_value(snapshot).unwrap();
        assert_eq!(value["request"], 1.0);
        assert_eq!(value["error"], 0.0);
        assert!(value.get("timestamp").is_some());

        let decoded: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_error_display() {
        let err = FuseError::StoreUnavailable("redis down".to_string());
        assert_eq!(err.to_string(), "Store unavailable: redis down");
        assert_eq!(TripReason::ErrorRate.as_str(), "error_rate");
    }
}
