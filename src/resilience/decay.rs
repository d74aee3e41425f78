//! Linear decay of snapshot counters.
//!
//! Counters shrink at a constant rate per second of wall-clock time instead
//! of resetting at window boundaries. A counter that is never fed drains to
//! its floor in `count / rate` seconds, which models a sliding window
//! without keeping individual events.

use std::time::SystemTime;

use crate::config::schema::FuseSettings;
use crate::resilience::types::Snapshot;

/// Per-second drain rates, derived once from settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayRates {
    pub request_per_sec: f64,
    pub error_per_sec: f64,
}

impl DecayRates {
    /// `max_X / timeframe_secs`. Disabled (non-positive) maxima drain at 0.
    ///
    /// `timeframe_secs` must already be validated as positive.
    pub fn from_settings(settings: &FuseSettings) -> Self {
        let timeframe = settings.timeframe_secs as f64;
        Self {
            request_per_sec: settings.max_request.max(0) as f64 / timeframe,
            error_per_sec: settings.max_error.max(0) as f64 / timeframe,
        }
    }
}

/// Lower bounds applied after decaying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Floors {
    pub request: f64,
    pub error: f64,
}

impl Floors {
    /// Used before a decision. Request never drops below 1 so the error
    /// ratio stays finite.
    pub const DECISION: Floors = Floors {
        request: 1.0,
        error: 0.0,
    };

    /// Used before recording an outcome.
    pub const UPDATE: Floors = Floors {
        request: 0.0,
        error: 0.0,
    };
}

/// Counters as of a given instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decayed {
    pub request: f64,
    pub error: f64,
    /// Seconds since the snapshot timestamp, never negative.
    pub elapsed_secs: f64,
}

impl Decayed {
    /// Store the counters back as a snapshot stamped `now`.
    pub fn into_snapshot(self, now: SystemTime) -> Snapshot {
        Snapshot {
            request_count: self.request,
            error_count: self.error,
            timestamp: now,
        }
    }
}

/// Decay `snapshot` to `now`.
///
/// A `now` earlier than the snapshot counts as zero elapsed time.
pub fn decay(snapshot: &Snapshot, now: SystemTime, rates: DecayRates, floors: Floors) -> Decayed {
    let elapsed_secs = now
        .duration_since(snapshot.timestamp)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);

    let request = (snapshot.request_count - elapsed_secs * rates.request_per_sec).max(floors.request);
    let error = (snapshot.error_count - elapsed_secs * rates.error_per_sec).max(floors.error);

    Decayed {
        request,
        error,
        elapsed_secs,
    }
}
