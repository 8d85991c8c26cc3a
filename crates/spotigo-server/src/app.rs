//! Application assembly.
//!
//! Builds the shared state once from `AppConfig` and hands it to the web
//! server. Nothing here is global; tests build as many applications as
//! they need.

use spotigo_spotify::Authenticator;
use spotigo_web::{AppState, TokenAuth};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;
use crate::error::AppResult;

/// Main application.
#[derive(Debug)]
pub struct Application {
    config: AppConfig,
    state: AppState,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let authenticator = Authenticator::new(config.authenticator_config())?;
        let token_auth = TokenAuth::new(config.token_secret.as_bytes());
        let state = AppState::new(authenticator, token_auth, config.web_config());

        info!(
            redirect_url = %config.spotify_redirect_url,
            assets_dir = %config.assets_dir.display(),
            "Application initialized"
        );

        Ok(Self { config, state })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Bind the configured port and serve until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        spotigo_web::run_server(self.state, self.config.bind_addr()).await?;
        Ok(())
    }

    /// Serve on an already bound listener until Ctrl-C.
    pub async fn serve(self, listener: TcpListener) -> AppResult<()> {
        spotigo_web::serve(listener, self.state).await?;
        Ok(())
    }
}
