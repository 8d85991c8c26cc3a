//! Structured logging initialization.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{TelemetryError, TelemetryResult};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,spotigo=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// JSON for `production`, pretty for anything else.
    pub fn from_rust_env(value: Option<&str>) -> Self {
        match value {
            Some("production") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }

    pub fn from_env() -> Self {
        Self::from_rust_env(std::env::var("RUST_ENV").ok().as_deref())
    }
}

fn env_filter(directives: Option<&str>) -> TelemetryResult<EnvFilter> {
    match directives {
        Some(directives) => {
            EnvFilter::try_new(directives).map_err(|e| TelemetryError::Filter(e.to_string()))
        }
        None => Ok(EnvFilter::new(DEFAULT_FILTER)),
    }
}

/// Install the global subscriber.
///
/// Fails if `RUST_LOG` does not parse or a subscriber is already set.
pub fn init_logging() -> TelemetryResult<()> {
    let directives = std::env::var("RUST_LOG").ok();
    let env_filter = env_filter(directives.as_deref().filter(|d| !d.trim().is_empty()))?;

    let result = match LogFormat::from_env() {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(true))
            .try_init(),
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
