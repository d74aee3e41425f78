//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PolyfuseConfig (validated, immutable)
//!     → FuseSettings handed to each breaker at build time
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once a breaker is built
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Breakers built in code run the same semantic checks as loaded files

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::FuseSettings;
pub use schema::ObservabilityConfig;
pub use schema::PolyfuseConfig;
