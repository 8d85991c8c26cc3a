//! OAuth2 authorization-code flow against the Spotify accounts service.

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::client::SpotifyClient;
use crate::error::{SpotifyError, SpotifyResult};
use crate::token::{OAuthToken, TokenResponse};

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

pub const SCOPE_USER_READ_PRIVATE: &str = "user-read-private";
pub const SCOPE_USER_READ_CURRENTLY_PLAYING: &str = "user-read-currently-playing";
pub const SCOPE_USER_READ_PLAYBACK_STATE: &str = "user-read-playback-state";
pub const SCOPE_USER_MODIFY_PLAYBACK_STATE: &str = "user-modify-playback-state";
pub const SCOPE_USER_READ_RECENTLY_PLAYED: &str = "user-read-recently-played";
pub const SCOPE_USER_TOP_READ: &str = "user-top-read";
pub const SCOPE_PLAYLIST_MODIFY_PUBLIC: &str = "playlist-modify-public";
pub const SCOPE_PLAYLIST_MODIFY_PRIVATE: &str = "playlist-modify-private";
pub const SCOPE_PLAYLIST_READ_PRIVATE: &str = "playlist-read-private";

/// Scopes requested at login.
pub const SCOPES: &[&str] = &[
    SCOPE_USER_READ_PRIVATE,
    SCOPE_USER_READ_CURRENTLY_PLAYING,
    SCOPE_USER_READ_PLAYBACK_STATE,
    SCOPE_USER_MODIFY_PLAYBACK_STATE,
    SCOPE_USER_READ_RECENTLY_PLAYED,
    SCOPE_USER_TOP_READ,
    SCOPE_PLAYLIST_MODIFY_PUBLIC,
    SCOPE_PLAYLIST_MODIFY_PRIVATE,
    SCOPE_PLAYLIST_READ_PRIVATE,
];

/// Query parameters Spotify appends to the redirect URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Authenticator settings.
#[derive(Debug, Clone)]
pub struct AuthenticatorConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Must exactly match a redirect URL registered for the application.
    pub redirect_url: String,
    /// Base URL of the accounts service (overridable for tests).
    pub accounts_url: String,
    /// Base URL of the Web API handed to clients built by this authenticator.
    pub api_url: String,
}

/// Builds authorize URLs, exchanges codes for tokens and hands out API clients.
///
/// Cheap to clone; the inner `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct Authenticator {
    config: AuthenticatorConfig,
    scopes: Vec<String>,
    http: Client,
}

impl Authenticator {
    pub fn new(config: AuthenticatorConfig) -> SpotifyResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| SpotifyError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            http,
        })
    }

    /// Replace the default scope list.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn redirect_url(&self) -> &str {
        &self.config.redirect_url
    }

    /// URL the browser is sent to for consent.
    pub fn auth_url(&self, state: &str) -> String {
        let scope = self.scopes.join(" ");
        let query = serde_urlencoded::to_string([
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state),
        ])
        .unwrap_or_default();

        format!(
            "{}/authorize?{}",
            self.config.accounts_url.trim_end_matches('/'),
            query
        )
    }

    /// Validate the callback against the expected state and exchange the code.
    pub async fn token(
        &self,
        expected_state: &str,
        params: &CallbackParams,
    ) -> SpotifyResult<OAuthToken> {
        if let Some(error) = params.error.as_deref() {
            return Err(SpotifyError::OAuth(format!("authorization denied: {error}")));
        }

        if params.state.as_deref() != Some(expected_state) {
            warn!("OAuth callback state does not match state cookie");
            return Err(SpotifyError::StateMismatch);
        }

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(SpotifyError::MissingCode)?;

        self.exchange_code(code).await
    }

    /// Exchange an authorization code for a token.
    pub async fn exchange_code(&self, code: &str) -> SpotifyResult<OAuthToken> {
        info!("Exchanging authorization code for token");

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ];

        let response = self.request_token(&form).await?;
        Ok(response.into_token(Utc::now(), None))
    }

    /// Obtain a fresh access token using the token's refresh token.
    pub async fn refresh(&self, token: &OAuthToken) -> SpotifyResult<OAuthToken> {
        if !token.can_refresh() {
            return Err(SpotifyError::OAuth(
                "token expired and has no refresh token".to_string(),
            ));
        }

        debug!("Refreshing expired access token");

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", token.refresh_token.as_str()),
        ];

        let response = self.request_token(&form).await?;
        Ok(response.into_token(Utc::now(), Some(&token.refresh_token)))
    }

    /// Web API client acting on behalf of `token`.
    pub fn client(&self, token: OAuthToken) -> SpotifyClient {
        SpotifyClient::new(
            self.http.clone(),
            self.config.api_url.clone(),
            token,
            Some(self.clone()),
        )
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> SpotifyResult<TokenResponse> {
        let url = format!(
            "{}/api/token",
            self.config.accounts_url.trim_end_matches('/')
        );

        let body = serde_urlencoded::to_string(form)
            .map_err(|e| SpotifyError::OAuth(format!("Failed to encode token request: {e}")))?;

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await
            .map_err(|e| SpotifyError::Http(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // 400/401 carry `invalid_grant` and friends; anything else is transient.
            if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
                return Err(SpotifyError::OAuth(format!("HTTP {status}: {body}")));
            }
            return Err(SpotifyError::Status { status, body });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| SpotifyError::Decode(format!("Failed to parse token response: {e}")))
    }
}
