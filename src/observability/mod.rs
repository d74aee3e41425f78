//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breakers and guards produce:
//!     → tracing events (decisions, trips, store failures)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The library only emits; installing a subscriber or exporter is up to
//!   the binary
//! - Metric updates without an installed recorder are no-ops
//! - Labels are the fuse id plus one low-cardinality dimension

pub mod logging;
pub mod metrics;
