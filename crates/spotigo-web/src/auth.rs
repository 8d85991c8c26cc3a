//! OAuth login, callback and logout routes.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::Rng;
use spotigo_spotify::CallbackParams;
use tracing::{error, info, warn};

use crate::session::SESSION_COOKIE;
use crate::state::AppState;

/// Cookie holding the OAuth `state` between login and callback.
pub const STATE_COOKIE: &str = "state";

const STATE_MAX_AGE_SECS: u64 = 300;

/// 32 random bytes, URL-safe base64.
pub fn generate_state() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE.encode(bytes)
}

fn internal_error(message: &'static str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}

/// `GET /auth/login`
pub async fn login(State(state): State<AppState>, jar: CookieJar) -> Response {
    let oauth_state = generate_state();

    let cookie = match Cookie::parse(format!(
        "{STATE_COOKIE}={oauth_state}; Path=/; HttpOnly; Max-Age={STATE_MAX_AGE_SECS}"
    )) {
        Ok(cookie) => cookie,
        Err(e) => {
            error!(error = %e, "Failed to build state cookie");
            return internal_error("Failed to generate state");
        }
    };

    let url = state.authenticator.auth_url(&oauth_state);
    info!("Redirecting to Spotify for authorization");
    (jar.add(cookie), Redirect::temporary(&url)).into_response()
}

/// `GET /auth/callback`
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(expected) = jar.get(STATE_COOKIE).map(|c| c.value().to_string()) else {
        warn!("OAuth callback without state cookie");
        return internal_error("Failed to get state cookie");
    };

    let jar = jar.remove(Cookie::build(STATE_COOKIE).path("/"));

    let token = match state.authenticator.token(&expected, &params).await {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Failed to obtain token");
            return (jar, (StatusCode::NOT_FOUND, "Couldn't get token")).into_response();
        }
    };

    let jwt = match state.token_auth.encode(&token) {
        Ok(jwt) => jwt,
        Err(e) => {
            error!(error = %e, "Failed to encode session token");
            return (jar, internal_error("Failed to create session")).into_response();
        }
    };

    let session = Cookie::build((SESSION_COOKIE, jwt))
        .path("/")
        .http_only(true);

    info!("User logged in");
    (jar.add(session), Redirect::temporary("/")).into_response()
}

/// `GET /auth/logout`
pub async fn logout(jar: CookieJar) -> Response {
    info!("User logged out");
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::temporary("/")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_32_random_bytes() {
        let a = generate_state();
        let b = generate_state();
        assert_ne!(a, b);
        assert_eq!(URL_SAFE.decode(&a).unwrap().len(), 32);
        assert!(!a.contains('+') && !a.contains('/'));
    }
}
