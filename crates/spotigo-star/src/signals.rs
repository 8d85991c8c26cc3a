//! Reading typed signals from a request and running an RPC body.

use std::future::Future;

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{Method, StatusCode};
use axum::response::sse::Sse;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::writer::StarWriter;

/// Query parameter Datastar uses for signals on `GET` requests.
pub const DATASTAR_QUERY_PARAM: &str = "datastar";

/// Signals could not be read from the request.
///
/// Absent signals are not an error; they decode to `T::default()`.
#[derive(Debug, Error)]
pub enum SignalsError {
    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("failed to decode signals: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to decode query string: {0}")]
    Query(#[from] serde_urlencoded::de::Error),
}

impl IntoResponse for SignalsError {
    fn into_response(self) -> Response {
        warn!(error = %self, "Rejecting request with unreadable signals");
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

/// Query string parameters of an RPC call, in order, repeats preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcParams {
    pairs: Vec<(String, String)>,
}

impl RpcParams {
    pub fn parse(query: &str) -> Result<Self, SignalsError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)?;
        Ok(Self { pairs })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// First value for `key`, empty values included.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value for `key`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// All non-empty values for `key`, e.g. `track_ids[]`.
    pub fn all(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.clone())
            .collect()
    }
}

/// Decode signals of type `T` from `method`, the query string and the body.
///
/// `GET` reads JSON from the `datastar` query parameter, every other method
/// reads the body. Missing or blank input yields `T::default()`.
pub fn read_signals<T>(method: &Method, params: &RpcParams, body: &[u8]) -> Result<T, SignalsError>
where
    T: DeserializeOwned + Default,
{
    let raw: &[u8] = if *method == Method::GET {
        params
            .get(DATASTAR_QUERY_PARAM)
            .map(str::as_bytes)
            .unwrap_or_default()
    } else {
        body
    };

    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    Ok(serde_json::from_slice(raw)?)
}

/// Extracted RPC input: decoded signals plus query parameters.
#[derive(Debug)]
pub struct Star<T> {
    pub signals: T,
    pub params: RpcParams,
}

impl<T, S> FromRequest<S> for Star<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = SignalsError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let method = req.method().clone();
        let params = RpcParams::parse(req.uri().query().unwrap_or_default())?;

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| SignalsError::Body(e.to_string()))?;

        let signals = read_signals(&method, &params, &body)?;
        Ok(Self { signals, params })
    }
}

impl<T> Star<T>
where
    T: Serialize + Send + 'static,
{
    /// Run `handler` on its own task and stream its writes back as SSE.
    ///
    /// The response is returned immediately. When the client disconnects
    /// the handler future is dropped, cancelling in-flight upstream calls.
    pub fn stream<F, Fut>(self, handler: F) -> Response
    where
        F: FnOnce(StarWriter<T>, T, RpcParams) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (writer, rx) = StarWriter::channel();
        let watcher = writer.clone();
        let task = handler(writer, self.signals, self.params);

        tokio::spawn(async move {
            tokio::select! {
                _ = task => {}
                _ = watcher.closed() => {
                    debug!("Client disconnected, cancelling RPC handler");
                }
            }
        });

        Sse::new(rx.into_sse_stream()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct TestSignals {
        selected_song: String,
        dialog_open: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        recent_songs: Option<Vec<String>>,
    }

    #[test]
    fn test_absent_fields_default() {
        let signals: TestSignals =
            read_signals(&Method::POST, &RpcParams::default(), br#"{"dialog_open":true}"#)
                .unwrap();
        assert!(signals.dialog_open);
        assert_eq!(signals.selected_song, "");
        assert!(signals.recent_songs.is_none());
    }

    #[test]
    fn test_empty_body_is_default() {
        let signals: TestSignals =
            read_signals(&Method::POST, &RpcParams::default(), b"  ").unwrap();
        assert_eq!(signals, TestSignals::default());
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let result: Result<TestSignals, _> =
            read_signals(&Method::POST, &RpcParams::default(), b"{not json");
        assert!(matches!(result, Err(SignalsError::Decode(_))));

        let result: Result<TestSignals, _> = read_signals(
            &Method::POST,
            &RpcParams::default(),
            br#"{"dialog_open":"yes"}"#,
        );
        assert!(matches!(result, Err(SignalsError::Decode(_))));
    }

    #[test]
    fn test_get_reads_datastar_query_param() {
        let params =
            RpcParams::parse("datastar=%7B%22selected_song%22%3A%22abc%22%7D&x=1").unwrap();
        let signals: TestSignals = read_signals(&Method::GET, &params, b"ignored").unwrap();
        assert_eq!(signals.selected_song, "abc");
    }

    #[test]
    fn test_rpc_params() {
        let params =
            RpcParams::parse("track_id=&track_ids%5B%5D=a&track_ids%5B%5D=b&track_ids%5B%5D=")
                .unwrap();
        assert_eq!(params.get("track_id"), Some(""));
        assert_eq!(params.value("track_id"), None);
        assert_eq!(params.all("track_ids[]"), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_extractor_reads_body_and_query() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/rpc/queue-track?track_id=t1")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"recent_songs":["a","b"]}"#))
            .unwrap();

        let star: Star<TestSignals> = Star::from_request(req, &()).await.unwrap();
        assert_eq!(star.params.value("track_id"), Some("t1"));
        assert_eq!(
            star.signals.recent_songs,
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[tokio::test]
    async fn test_extractor_rejects_malformed_signals() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/rpc/get-top-songs")
            .body(Body::from("[1,2"))
            .unwrap();

        let rejection = Star::<TestSignals>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(rejection.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stream_returns_event_stream() {
        let star = Star {
            signals: TestSignals::default(),
            params: RpcParams::default(),
        };
        let response = star.stream(|w, mut signals, _params| async move {
            w.replace_inner("#a", "<p>x</p>");
            signals.selected_song = "s".to_string();
            w.update_signals(&signals);
        });

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("event: datastar-patch-elements"));
        assert!(text.contains("data: mode inner"));
        assert!(text.contains(r#"data: signals {"selected_song":"s","dialog_open":false}"#));
        let elements_at = text.find("datastar-patch-elements").unwrap();
        let signals_at = text.find("datastar-patch-signals").unwrap();
        assert!(elements_at < signals_at);
    }

    #[tokio::test]
    async fn test_stream_cancels_handler_when_client_disconnects() {
        let star = Star {
            signals: TestSignals::default(),
            params: RpcParams::default(),
        };
        let (alive_tx, alive_rx) = tokio::sync::oneshot::channel::<()>();

        let response = star.stream(move |w, _signals, _params| async move {
            let _alive = alive_tx;
            w.replace_inner("#a", "<p>started</p>");
            std::future::pending::<()>().await;
        });
        drop(response);

        // The sender is only dropped if the handler future was dropped.
        let outcome = tokio::time::timeout(std::time::Duration::from_secs(2), alive_rx)
            .await
            .expect("handler was not cancelled");
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn test_stream_ends_when_handler_finishes() {
        let star = Star {
            signals: TestSignals::default(),
            params: RpcParams::default(),
        };
        let response = star.stream(|_w, _signals, _params| async {});

        let body = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            axum::body::to_bytes(response.into_body(), usize::MAX),
        )
        .await
        .expect("stream stayed open after the handler returned")
        .unwrap();
        assert!(body.is_empty());
    }
}
