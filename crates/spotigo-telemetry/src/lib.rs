//! Structured logging for spotigo.
//!
//! - `tracing` subscriber with an `EnvFilter` (`RUST_LOG`)
//! - JSON output when `RUST_ENV=production`, pretty output otherwise

pub mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogFormat, DEFAULT_FILTER};
