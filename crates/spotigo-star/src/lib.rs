//! spotigo-star - fragment patches and signal sync over Server-Sent Events.
//!
//! Every `/rpc/*` route follows the same shape:
//!
//! ```text
//!  POST /rpc/<name>?track_id=...        body: {"selected_song": ...}
//!        │
//!        ▼
//!  Star<T> extractor ── decode signals T (400 on malformed JSON)
//!        │
//!        ▼
//!  Star::stream(handler) ── spawn handler(StarWriter<T>, T, RpcParams)
//!        │                        │ replace / replace_inner / append
//!        │                        │ update_signals / redirect
//!        ▼                        ▼
//!  text/event-stream  ◄──── PatchReceiver (in call order)
//! ```

pub mod event;
pub mod rpc;
pub mod signals;
pub mod writer;

pub use event::{PatchEvent, PatchMode, EVENT_PATCH_ELEMENTS, EVENT_PATCH_SIGNALS};
pub use rpc::{RpcAction, RpcMethod};
pub use signals::{read_signals, RpcParams, SignalsError, Star, DATASTAR_QUERY_PARAM};
pub use writer::{escape_js_single_quoted, PatchReceiver, StarWriter};
