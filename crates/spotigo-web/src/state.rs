//! Shared application state.
//!
//! Constructed once at startup and cloned into every handler. Nothing in
//! here is mutated after construction.

use std::sync::Arc;

use spotigo_spotify::{Authenticator, DynMusicApi, OAuthToken};

use crate::config::WebConfig;
use crate::session::{Session, TokenAuth};

/// Builds a music API client for one request's session.
pub trait ApiFactory: Send + Sync {
    fn api_for(&self, token: OAuthToken) -> DynMusicApi;
}

impl ApiFactory for Authenticator {
    fn api_for(&self, token: OAuthToken) -> DynMusicApi {
        Arc::new(self.client(token))
    }
}

/// Hands every session the same API instance.
///
/// Used to run the router against `MockMusicApi`.
pub struct SharedApi(pub DynMusicApi);

impl ApiFactory for SharedApi {
    fn api_for(&self, _token: OAuthToken) -> DynMusicApi {
        self.0.clone()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub authenticator: Authenticator,
    pub token_auth: TokenAuth,
    pub config: WebConfig,
    api: Arc<dyn ApiFactory>,
}

impl AppState {
    /// State whose API clients act on behalf of the session's token.
    pub fn new(authenticator: Authenticator, token_auth: TokenAuth, config: WebConfig) -> Self {
        let api: Arc<dyn ApiFactory> = Arc::new(authenticator.clone());
        Self {
            authenticator,
            token_auth,
            config,
            api,
        }
    }

    /// Replace how API clients are built.
    pub fn with_api_factory(mut self, factory: impl ApiFactory + 'static) -> Self {
        self.api = Arc::new(factory);
        self
    }

    pub fn api_for(&self, session: &Session) -> DynMusicApi {
        self.api.api_for(session.token.clone())
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
