//! Trip decision engine and outcome accounting.
//!
//! # Decision order
//! ```text
//! decay to now (request floor 1)
//!     → request >= max_request ?          trip
//!     → error >= max_error ?              trip
//!     → error / request > ramp threshold ? trip
//!     → allow
//! ```
//!
//! # Ramp
//! Right after a snapshot is taken the sample behind it is tiny, so the
//! error-rate limit starts near 100% and slides to the configured rate along
//! a sigmoid over `ramp_secs`. A lone failure on a fresh or long-idle fuse
//! cannot trip it.

use std::time::SystemTime;

use crate::config::schema::{FuseSettings, ERROR_RATE_SCALE};
use crate::resilience::decay::{decay, DecayRates, Floors};
use crate::resilience::types::{Decision, Snapshot, TripReason};

/// Limits a policy evaluates against, fixed when the fuse is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripLimits {
    /// `<= 0` disables the request ceiling.
    pub max_request: i64,
    /// `<= 0` disables the error ceiling.
    pub max_error: i64,
    /// Target error ratio in `[0, 1]`. `0` disables the rate check.
    pub error_rate: f64,
    pub ramp_secs: f64,
    pub rates: DecayRates,
}

impl TripLimits {
    /// Derive limits from normalized, validated settings.
    pub fn from_settings(settings: &FuseSettings) -> Self {
        Self {
            max_request: settings.max_request,
            max_error: settings.max_error,
            error_rate: settings.error_rate as f64 / ERROR_RATE_SCALE as f64,
            ramp_secs: settings.ramp_secs as f64,
            rates: DecayRates::from_settings(settings),
        }
    }
}

/// Decides whether a caller may proceed.
pub trait DecisionPolicy: Send + Sync {
    fn decide(&self, snapshot: &Snapshot, now: SystemTime, limits: &TripLimits) -> Decision;
}

/// Folds an outcome into the snapshot.
pub trait UpdatePolicy: Send + Sync {
    fn update(&self, success: bool, snapshot: &Snapshot, now: SystemTime, limits: &TripLimits) -> Snapshot;
}

/// Sigmoid ramp: `1` at `span = 0`, `0.5` at `span = ramp / 2`, near `0`
/// past `ramp`.
pub fn sigmoid(span: f64, ramp: f64) -> f64 {
    1.0 / (1.0 + (span * 12.0 / ramp - 6.0).exp())
}

/// Effective error-rate limit `span` seconds into the ramp.
pub fn threshold(span: f64, ramp: f64, target_rate: f64) -> f64 {
    sigmoid(span, ramp) * (1.0 - target_rate) + target_rate
}

/// Ceiling and ramped error-rate checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDecision;

impl DecisionPolicy for DefaultDecision {
    fn decide(&self, snapshot: &Snapshot, now: SystemTime, limits: &TripLimits) -> Decision {
        let decayed = decay(snapshot, now, limits.rates, Floors::DECISION);

        if limits.max_request > 0 && decayed.request >= limits.max_request as f64 {
            return Decision::Trip(TripReason::RequestCeiling);
        }

        if limits.max_error > 0 && decayed.error >= limits.max_error as f64 {
            return Decision::Trip(TripReason::ErrorCeiling);
        }

        if limits.error_rate > 0.0 {
            let current = decayed.error / decayed.request;
            if current > threshold(decayed.elapsed_secs, limits.ramp_secs, limits.error_rate) {
                return Decision::Trip(TripReason::ErrorRate);
            }
        }

        // Keep the request floor of 1 so a lone failure on an idle fuse is
        // judged as 1 error in 2 requests, not 1 in 1.
        Decision::Allow(decayed.into_snapshot(now))
    }
}

/// Every outcome is a request; failures are also errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUpdate;

impl UpdatePolicy for DefaultUpdate {
    fn update(&self, success: bool, snapshot: &Snapshot, now: SystemTime, limits: &TripLimits) -> Snapshot {
        let mut decayed = decay(snapshot, now, limits.rates, Floors::UPDATE);
        decayed.request += 1.0;
        if !success {
            decayed.error += 1.0;
        }
        decayed.into_snapshot(now)
    }
}
