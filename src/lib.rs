//! Adaptive decaying circuit breaker library.
//!
//! A fuse keeps two counters, recent requests and recent errors, that drain
//! linearly with wall-clock time. Callers ask the fuse before a risky
//! operation and report the outcome afterwards; the fuse trips when either
//! counter reaches its ceiling or when the error ratio exceeds a limit that
//! is relaxed while the snapshot is young.

pub mod config;
pub mod observability;
pub mod resilience;

pub use config::schema::{FuseSettings, PolyfuseConfig};
pub use resilience::{DecayingFuse, Fuse, FuseBuilder, FuseError, FuseResult, Snapshot};
