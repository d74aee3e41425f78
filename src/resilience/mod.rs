//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Guarded call (guard.rs):
//!     → Fuse::get_state()
//!         → store.rs (fetch snapshot)
//!         → decay.rs (drain counters to now)
//!         → decision.rs (request ceiling, error ceiling, ramped error rate)
//!         → store.rs (persist decayed snapshot on allow)
//!     → run operation
//!     → Fuse::push_state(ok)
//!         → decay.rs → decision.rs (count outcome) → store.rs
//! ```
//!
//! # Design Decisions
//! - No background timers; decay is computed lazily from elapsed time
//! - Store, clock and both policies are injected at build time
//! - Reporting an outcome never trips; only `get_state` decides

pub mod circuit_breaker;
pub mod clock;
pub mod decay;
pub mod decision;
pub mod guard;
pub mod registry;
pub mod store;
pub mod types;

pub use circuit_breaker::{DecayingFuse, FuseBuilder};
pub use types::{FuseError, FuseResult, Snapshot};

/// A guard deciding whether callers may run a protected operation.
pub trait Fuse: Send + Sync {
    /// Opaque identity, for logging and metrics correlation.
    fn id(&self) -> &str;

    /// `true` if the caller may proceed. Errors only when the store fails.
    fn get_state(&self) -> FuseResult<bool>;

    /// Report the outcome of an operation already performed.
    fn push_state(&self, success: bool) -> FuseResult<()>;
}
