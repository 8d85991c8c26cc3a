//! Fragment-patch and signal-sync writer.
//!
//! Handlers push events through a `StarWriter`; the paired `PatchReceiver`
//! feeds the SSE response body. Events arrive in call order. Once the
//! client has gone away every write becomes a no-op.

use std::convert::Infallible;
use std::marker::PhantomData;

use axum::response::sse::Event;
use futures_util::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::event::{PatchEvent, PatchMode};

/// Writer for one RPC response, typed by the signals record it syncs.
pub struct StarWriter<S> {
    tx: mpsc::UnboundedSender<PatchEvent>,
    _signals: PhantomData<fn(&S)>,
}

impl<S> Clone for StarWriter<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            _signals: PhantomData,
        }
    }
}

impl<S> std::fmt::Debug for StarWriter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StarWriter")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<S: Serialize> StarWriter<S> {
    /// Create a writer and the receiver that drains it.
    pub fn channel() -> (Self, PatchReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                _signals: PhantomData,
            },
            PatchReceiver { rx },
        )
    }

    /// Send a raw event. Dropped silently if the client disconnected.
    pub fn send(&self, event: PatchEvent) {
        if self.tx.send(event).is_err() {
            trace!("Client disconnected, dropping patch event");
        }
    }

    /// Patch `html` into `selector` using `mode`.
    pub fn patch(&self, selector: &str, mode: PatchMode, html: impl Into<String>) {
        self.send(PatchEvent::Elements {
            selector: selector.to_string(),
            mode,
            elements: html.into(),
        });
    }

    /// Replace the whole element matching `selector`.
    pub fn replace(&self, selector: &str, html: impl Into<String>) {
        self.patch(selector, PatchMode::Outer, html);
    }

    /// Replace the children of the element matching `selector`.
    pub fn replace_inner(&self, selector: &str, html: impl Into<String>) {
        self.patch(selector, PatchMode::Inner, html);
    }

    /// Append `html` as the last child of `selector`.
    pub fn append(&self, selector: &str, html: impl Into<String>) {
        self.patch(selector, PatchMode::Append, html);
    }

    /// Emit `signals` as a merge-patch of the client's signals.
    pub fn update_signals(&self, signals: &S) {
        match serde_json::to_string(signals) {
            Ok(json) => self.send(PatchEvent::Signals { signals: json }),
            Err(e) => warn!(error = %e, "Failed to serialize signals"),
        }
    }

    /// Navigate the browser to `url`.
    ///
    /// Appends a self-removing script to `body`.
    pub fn redirect(&self, url: &str) {
        debug!(url, "Redirecting client");
        let script = format!(
            "<script data-effect=\"el.remove()\">setTimeout(() => window.location.href = '{}')</script>",
            escape_js_single_quoted(url)
        );
        self.append("body", script);
    }

    /// True once the client stopped listening.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves when the client stops listening.
    pub async fn closed(&self) {
        self.tx.closed().await;
    }
}

/// Receiving half of a `StarWriter`.
#[derive(Debug)]
pub struct PatchReceiver {
    rx: mpsc::UnboundedReceiver<PatchEvent>,
}

impl PatchReceiver {
    /// Next event, or `None` once every writer has been dropped.
    pub async fn recv(&mut self) -> Option<PatchEvent> {
        self.rx.recv().await
    }

    /// Events already written, without waiting.
    pub fn drain(&mut self) -> Vec<PatchEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Stream of SSE events for `axum::response::Sse`.
    pub fn into_sse_stream(self) -> impl Stream<Item = Result<Event, Infallible>> + Send {
        stream::unfold(self.rx, |mut rx| async move {
            rx.recv().await.map(|event| (Ok(event.to_sse()), rx))
        })
    }
}

/// Escape `value` for use inside a single-quoted JavaScript string literal.
pub fn escape_js_single_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '<' => out.push_str("\\x3C"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}
