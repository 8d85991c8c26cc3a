//! Spotify client error types.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Spotify API returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Access token rejected by Spotify")]
    Unauthorized,

    #[error("Failed to decode Spotify response: {0}")]
    Decode(String),

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("Authorization code missing from callback")]
    MissingCode,
}

impl SpotifyError {
    /// True when the failure means the session can no longer talk to Spotify.
    ///
    /// Covers a 401 from the Web API and a token endpoint rejecting the grant.
    /// Transient failures (timeouts, 5xx, 429) return false, including those
    /// hit while refreshing.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SpotifyError::Unauthorized | SpotifyError::OAuth(_))
    }
}

impl From<reqwest::Error> for SpotifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SpotifyError::Decode(err.to_string())
        } else {
            SpotifyError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SpotifyError {
    fn from(err: serde_json::Error) -> Self {
        SpotifyError::Decode(err.to_string())
    }
}

pub type SpotifyResult<T> = Result<T, SpotifyError>;
