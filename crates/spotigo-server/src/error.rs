//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Spotify error: {0}")]
    Spotify(#[from] spotigo_spotify::SpotifyError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] spotigo_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
