//! OAuth token carried in the session cookie.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Refresh this long before the upstream expiry to avoid racing it.
const EXPIRY_MARGIN_SECS: i64 = 10;

/// OAuth2 token for the Spotify Web API.
///
/// Serialized field names match what the session cookie has always carried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Absent for tokens that never expire (and for hand-built test tokens).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl OAuthToken {
    /// Create a bearer token without expiry.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            refresh_token: String::new(),
            expiry: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_MARGIN_SECS) <= now,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        let token_type = if self.token_type.is_empty() {
            "Bearer"
        } else {
            self.token_type.as_str()
        };
        format!("{} {}", token_type, self.access_token)
    }
}

/// Raw response of the accounts service token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    /// Convert to a token, keeping `previous_refresh` when the endpoint did
    /// not rotate the refresh token.
    pub fn into_token(self, now: DateTime<Utc>, previous_refresh: Option<&str>) -> OAuthToken {
        OAuthToken {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string))
                .unwrap_or_default(),
            expiry: self.expires_in.map(|secs| now + Duration::seconds(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_without_expiry_never_expires() {
        let token = OAuthToken::bearer("abc");
        assert!(!token.is_expired());
        assert_eq!(token.authorization(), "Bearer abc");
    }

    #[test]
    fn test_token_expiry_margin() {
        let now = Utc::now();
        let mut token = OAuthToken::bearer("abc");
        token.expiry = Some(now + Duration::seconds(5));
        assert!(token.is_expired_at(now));
        token.expiry = Some(now + Duration::seconds(60));
        assert!(!token.is_expired_at(now));
    }

    #[test]
    fn test_token_response_keeps_previous_refresh_token() {
        let now = Utc::now();
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"new","token_type":"Bearer","expires_in":3600}"#,
        )
        .unwrap();
        let token = response.into_token(now, Some("old-refresh"));
        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token, "old-refresh");
        assert_eq!(token.expiry, Some(now + Duration::seconds(3600)));
    }

    #[test]
    fn test_session_claim_shape() {
        let json = r#"{"access_token":"a","token_type":"Bearer","refresh_token":"r","expiry":"2030-01-01T00:00:00Z"}"#;
        let token: OAuthToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.refresh_token, "r");
        assert!(token.expiry.is_some());
    }
}
