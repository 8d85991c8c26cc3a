//! Application configuration.
//!
//! Read from the process environment, optionally layered over a TOML file.
//! Keys are the lowercased environment variable names (`PORT` → `port`).

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use config::{Config, Environment, File, FileFormat};
use rand::Rng;
use serde::{Deserialize, Serialize};
use spotigo_spotify::{AuthenticatorConfig, DEFAULT_ACCOUNTS_URL, DEFAULT_API_URL};
use spotigo_web::WebConfig;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// Environment variable naming the optional config file.
pub const CONFIG_PATH_ENV: &str = "SPOTIGO_CONFIG";

const DEFAULT_PORT: u16 = 8080;

/// Values as read from the sources, before defaults are applied.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    port: Option<u16>,
    host: Option<String>,
    spotify_client_id: Option<String>,
    spotify_client_secret: Option<String>,
    spotify_redirect_url: Option<String>,
    token_secret: Option<String>,
    assets_dir: Option<PathBuf>,
    spotify_accounts_url: Option<String>,
    spotify_api_url: Option<String>,
}

/// Resolved configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Public base URL, e.g. `http://localhost:8080`.
    pub host: String,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_redirect_url: String,
    pub token_secret: String,
    pub assets_dir: PathBuf,
    pub spotify_accounts_url: String,
    pub spotify_api_url: String,
}

/// Fields that are safe to log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanitizedConfig {
    pub port: u16,
    pub host: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn random_secret() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

impl AppConfig {
    /// Load from `path` (if given) and the process environment.
    ///
    /// A missing file is an error when a path was given explicitly.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        Self::from_sources(path, None)
    }

    /// Load from `path` and `env`; `None` reads the process environment.
    pub fn from_sources(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> AppResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let environment = Environment::default().try_parsing(true);
        let environment = match env {
            Some(vars) => environment.source(Some(vars.into_iter().collect())),
            None => environment,
        };
        builder = builder.add_source(environment);

        let raw: RawConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AppError::Config(format!("Failed to load config: {e}")))?;

        Ok(Self::resolve(raw))
    }

    fn resolve(raw: RawConfig) -> Self {
        let port = raw.port.unwrap_or(DEFAULT_PORT);
        let host = non_empty(raw.host)
            .map(|h| h.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{port}"));
        let spotify_redirect_url =
            non_empty(raw.spotify_redirect_url).unwrap_or_else(|| format!("{host}/auth/callback"));

        let token_secret = non_empty(raw.token_secret).unwrap_or_else(|| {
            warn!("TOKEN_SECRET not set, generated a random one; sessions will not survive a restart");
            random_secret()
        });

        let spotify_client_id = non_empty(raw.spotify_client_id).unwrap_or_default();
        let spotify_client_secret = non_empty(raw.spotify_client_secret).unwrap_or_default();
        if spotify_client_id.is_empty() || spotify_client_secret.is_empty() {
            warn!("SPOTIFY_CLIENT_ID or SPOTIFY_CLIENT_SECRET not set, login will fail");
        }

        Self {
            port,
            host,
            spotify_client_id,
            spotify_client_secret,
            spotify_redirect_url,
            token_secret,
            assets_dir: raw
                .assets_dir
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from("assets")),
            spotify_accounts_url: non_empty(raw.spotify_accounts_url)
                .unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string()),
            spotify_api_url: non_empty(raw.spotify_api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }

    pub fn sanitized(&self) -> SanitizedConfig {
        SanitizedConfig {
            port: self.port,
            host: self.host.clone(),
        }
    }

    /// Listen on all interfaces at `port`.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn web_config(&self) -> WebConfig {
        WebConfig {
            port: self.port,
            assets_dir: self.assets_dir.clone(),
            ..WebConfig::default()
        }
    }

    pub fn authenticator_config(&self) -> AuthenticatorConfig {
        AuthenticatorConfig {
            client_id: self.spotify_client_id.clone(),
            client_secret: self.spotify_client_secret.clone(),
            redirect_url: self.spotify_redirect_url.clone(),
            accounts_url: self.spotify_accounts_url.clone(),
            api_url: self.spotify_api_url.clone(),
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("spotify_client_id", &self.spotify_client_id)
            .field("spotify_client_secret", &"<redacted>")
            .field("spotify_redirect_url", &self.spotify_redirect_url)
            .field("token_secret", &"<redacted>")
            .field("assets_dir", &self.assets_dir)
            .field("spotify_accounts_url", &self.spotify_accounts_url)
            .field("spotify_api_url", &self.spotify_api_url)
            .finish()
    }
}
