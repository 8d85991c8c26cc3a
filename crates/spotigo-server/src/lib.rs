//! spotigo - server-rendered Spotify front-end.
//!
//! Wires configuration, the Spotify authenticator, session signing and the
//! web router into a runnable application.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{AppConfig, SanitizedConfig, CONFIG_PATH_ENV};
pub use error::{AppError, AppResult};
