//! JWT session cookie carrying the user's Spotify token.
//!
//! The cookie holds an HS256 JWT whose `token` claim is the OAuth token.
//! Requests without a verifiable token are sent to the login route.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use spotigo_spotify::OAuthToken;
use thiserror::Error;
use tracing::{debug, warn};

use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "jwt";

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session token in request")]
    Missing,

    #[error("invalid session token: {0}")]
    Invalid(String),

    #[error("failed to encode session token: {0}")]
    Encode(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    token: OAuthToken,
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct TokenAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuth")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

impl TokenAuth {
    pub fn new(secret: &[u8]) -> Self {
        // Session tokens carry no registered claims; upstream expiry lives
        // inside the OAuth token and is handled by refreshing.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn encode(&self, token: &OAuthToken) -> Result<String, SessionError> {
        let claims = SessionClaims {
            token: token.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SessionError::Encode(e.to_string()))
    }

    pub fn decode(&self, jwt: &str) -> Result<OAuthToken, SessionError> {
        let data = decode::<SessionClaims>(jwt, &self.decoding, &self.validation)
            .map_err(|e| SessionError::Invalid(e.to_string()))?;
        Ok(data.claims.token)
    }
}

/// Verified session, inserted into request extensions by `require_session`.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: OAuthToken,
}

/// Raw session token from the `Authorization` header or the session cookie.
fn find_token<'a>(request: &'a Request, jar: &'a CookieJar) -> Option<&'a str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value()))
        .filter(|t| !t.is_empty())
}

/// Middleware guarding every authenticated route.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let verified = find_token(&request, &jar)
        .ok_or(SessionError::Missing)
        .and_then(|jwt| state.token_auth.decode(jwt));

    match verified {
        Ok(token) => {
            debug!(path = %path, "Session verified");
            request.extensions_mut().insert(Session { token });
            next.run(request).await
        }
        Err(e) => {
            warn!(path = %path, error = %e, "Redirecting unauthenticated request");
            Redirect::temporary(&state.config.login_path).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_survives_encode_decode() {
        let auth = TokenAuth::new(b"secret");
        let mut token = OAuthToken::bearer("access");
        token.refresh_token = "refresh".to_string();

        let jwt = auth.encode(&token).unwrap();
        assert_eq!(auth.decode(&jwt).unwrap(), token);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let jwt = TokenAuth::new(b"one").encode(&OAuthToken::bearer("a")).unwrap();
        let err = TokenAuth::new(b"two").decode(&jwt).unwrap_err();
        assert!(matches!(err, SessionError::Invalid(_)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let auth = TokenAuth::new(b"secret");
        assert!(auth.decode("not-a-jwt").is_err());
    }
}
