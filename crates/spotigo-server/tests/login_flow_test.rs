//! End-to-end login flow against a mock Spotify.
//!
//! Walks the browser's path by hand (redirects disabled):
//! `/` → `/auth/login` → authorize → `/auth/callback` → `/` and an RPC call.

mod common;

use std::collections::HashMap;

use reqwest::header::{self, HeaderMap};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use spotigo_server::{AppConfig, Application};
use tokio::net::TcpListener;

use common::mock_spotify::{MockSpotifyServer, MOCK_ACCESS_TOKEN, MOCK_CODE, MOCK_TOP_SONG};

struct TestApp {
    url: String,
    client: Client,
}

async fn start_app(spotify: &MockSpotifyServer) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let env: HashMap<String, String> = [
        ("HOST", url.clone()),
        ("SPOTIFY_CLIENT_ID", "client".to_string()),
        ("SPOTIFY_CLIENT_SECRET", "secret".to_string()),
        ("TOKEN_SECRET", "login-flow-secret".to_string()),
        ("SPOTIFY_ACCOUNTS_URL", spotify.url()),
        ("SPOTIFY_API_URL", format!("{}/v1", spotify.url())),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    let config = AppConfig::from_sources(None, Some(env)).unwrap();
    assert_eq!(config.spotify_redirect_url, format!("{url}/auth/callback"));

    let app = Application::new(config).unwrap();
    tokio::spawn(app.serve(listener));

    let client = Client::builder().redirect(Policy::none()).build().unwrap();
    TestApp { url, client }
}

fn location(headers: &HeaderMap) -> String {
    headers[header::LOCATION].to_str().unwrap().to_string()
}

/// `name=value` of the first `Set-Cookie` header for `name`.
fn set_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
}

/// Run the login flow and return the `jwt=...` cookie pair.
async fn log_in(app: &TestApp, spotify: &MockSpotifyServer) -> String {
    let response = app
        .client
        .get(format!("{}/auth/login", app.url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let state_cookie = set_cookie(response.headers(), "state").expect("state cookie");
    let authorize = location(response.headers());
    assert!(authorize.starts_with(&format!("{}/authorize?", spotify.url())));

    let response = app.client.get(&authorize).send().await.unwrap();
    assert!(response.status().is_redirection());
    let callback = location(response.headers());
    assert!(callback.starts_with(&format!("{}/auth/callback?", app.url)));
    assert!(callback.contains(&format!("code={MOCK_CODE}")));

    let response = app
        .client
        .get(&callback)
        .header(header::COOKIE, &state_cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(response.headers()), "/");

    let cleared = set_cookie(response.headers(), "state").expect("state cookie cleared");
    assert_eq!(cleared, "state=");

    set_cookie(response.headers(), "jwt").expect("session cookie")
}

#[tokio::test]
async fn test_unauthenticated_home_redirects_to_login() {
    let spotify = MockSpotifyServer::start().await;
    let app = start_app(&spotify).await;

    let response = app.client.get(&app.url).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(response.headers()), "/auth/login");
    assert!(spotify.received_requests().await.is_empty());

    spotify.shutdown();
}

#[tokio::test]
async fn test_login_flow_grants_session() {
    let spotify = MockSpotifyServer::start().await;
    let app = start_app(&spotify).await;

    let session = log_in(&app, &spotify).await;

    let requests = spotify.received_requests().await;
    assert_eq!(requests[0], "GET /authorize client_id=client");
    assert!(requests[1].starts_with("POST /api/token basic=true"));
    assert!(requests[1].contains("grant_type=authorization_code"));
    assert!(requests[1].contains(&format!("code={MOCK_CODE}")));

    let response = app
        .client
        .get(&app.url)
        .header(header::COOKIE, &session)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("id=\"playing-song\""));
    assert!(body.contains("id=\"top-songs\""));

    spotify.shutdown();
}

#[tokio::test]
async fn test_rpc_reaches_spotify_with_session_token() {
    let spotify = MockSpotifyServer::start().await;
    let app = start_app(&spotify).await;
    let session = log_in(&app, &spotify).await;

    let response = app
        .client
        .post(format!("{}/rpc/get-top-songs", app.url))
        .header(header::COOKIE, &session)
        .header(header::CONTENT_TYPE, "application/json")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    let text = response.text().await.unwrap();
    assert!(text.contains("event: datastar-patch-elements"));
    assert!(text.contains("data: selector #top-songs"));
    assert!(text.contains(MOCK_TOP_SONG));

    let requests = spotify.received_requests().await;
    assert!(requests.contains(&format!("GET /v1/me/top/tracks Bearer {MOCK_ACCESS_TOKEN}")));

    spotify.shutdown();
}

#[tokio::test]
async fn test_logout_clears_session() {
    let spotify = MockSpotifyServer::start().await;
    let app = start_app(&spotify).await;
    let session = log_in(&app, &spotify).await;

    let response = app
        .client
        .get(format!("{}/auth/logout", app.url))
        .header(header::COOKIE, &session)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(response.headers()), "/");
    assert_eq!(set_cookie(response.headers(), "jwt").as_deref(), Some("jwt="));

    spotify.shutdown();
}
