//! spotigo-web - Server-rendered Spotify front-end.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        axum Router                               │
//! │                                                                  │
//! │  GET  /auth/login, /auth/callback        (public)                │
//! │  GET  /assets/*                          (ServeDir)              │
//! │  ───────────── require_session (jwt cookie) ─────────────────    │
//! │  GET  /                     → page shell                         │
//! │  GET  /auth/logout                                               │
//! │  POST /rpc/<name>           → Star<T> → handler task → SSE       │
//! │                                          │                       │
//! │                                          ▼                       │
//! │                               DynMusicApi (Spotify Web API)      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use spotigo_web::{run_server, AppState, TokenAuth, WebConfig};
//!
//! let state = AppState::new(authenticator, TokenAuth::new(secret), WebConfig::default());
//! run_server(state, "0.0.0.0:8080".parse()?).await?;
//! ```

pub mod auth;
mod config;
pub mod handlers;
pub mod server;
pub mod session;
pub mod signals;
mod state;
pub mod views;

pub use config::WebConfig;
pub use handlers::RpcContext;
pub use server::{create_router, run_server, serve};
pub use session::{Session, SessionError, TokenAuth, SESSION_COOKIE};
pub use signals::{QueueTrackSignals, SpotigoSignals};
pub use state::{ApiFactory, AppState, SharedApi};
