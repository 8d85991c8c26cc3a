//! Web server configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// HTTP front-end configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served under `/assets`.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    /// Where unauthenticated requests are sent.
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

fn default_port() -> u16 {
    8080
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            assets_dir: default_assets_dir(),
            login_path: default_login_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: WebConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
        assert_eq!(config.login_path, "/auth/login");
    }
}
