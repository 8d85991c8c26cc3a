//! Mock Spotify accounts service and Web API for integration tests.
//!
//! Provides a small HTTP server that can:
//! - Answer the authorize redirect with a fixed code
//! - Hand out a fixed token from the token endpoint
//! - Serve a couple of Web API endpoints
//! - Record every request it receives

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

pub const MOCK_CODE: &str = "mock-code";
pub const MOCK_ACCESS_TOKEN: &str = "mock-access";
pub const MOCK_TOP_SONG: &str = "Mock Top Song";

type Requests = Arc<Mutex<Vec<String>>>;

/// A mock Spotify server for testing.
pub struct MockSpotifyServer {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    requests: Requests,
}

impl MockSpotifyServer {
    /// Start a new mock server on an available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests: Requests = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = Router::new()
            .route("/authorize", get(authorize))
            .route("/api/token", post(token))
            .route("/v1/me/top/tracks", get(top_tracks))
            .with_state(requests.clone());

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx,
            requests,
        }
    }

    /// Base URL, usable as both the accounts URL and the API host.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every request received so far, as `"<METHOD> <path> <detail>"`.
    pub async fn received_requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }

    /// Shutdown the server.
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

async fn authorize(
    State(requests): State<Requests>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let client_id = params.get("client_id").cloned().unwrap_or_default();
    requests
        .lock()
        .await
        .push(format!("GET /authorize client_id={client_id}"));

    let (Some(redirect_uri), Some(state)) = (params.get("redirect_uri"), params.get("state")) else {
        return (StatusCode::BAD_REQUEST, "missing redirect_uri or state").into_response();
    };

    let target = reqwest::Url::parse_with_params(
        redirect_uri,
        &[("code", MOCK_CODE), ("state", state.as_str())],
    )
    .unwrap();
    Redirect::to(target.as_str()).into_response()
}

async fn token(State(requests): State<Requests>, headers: HeaderMap, body: String) -> Response {
    let basic = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .starts_with("Basic ");
    requests
        .lock()
        .await
        .push(format!("POST /api/token basic={basic} {body}"));

    Json(json!({
        "access_token": MOCK_ACCESS_TOKEN,
        "token_type": "Bearer",
        "refresh_token": "mock-refresh",
        "expires_in": 3600,
    }))
    .into_response()
}

async fn top_tracks(State(requests): State<Requests>, headers: HeaderMap) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    requests
        .lock()
        .await
        .push(format!("GET /v1/me/top/tracks {authorization}"));

    if authorization != format!("Bearer {MOCK_ACCESS_TOKEN}") {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    Json(json!({
        "items": [
            { "id": "top1", "name": MOCK_TOP_SONG, "duration_ms": 185000 }
        ]
    }))
    .into_response()
}
