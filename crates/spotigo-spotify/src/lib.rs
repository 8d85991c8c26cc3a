//! Spotify OAuth authenticator and Web API client for spotigo.
//!
//! Provides the upstream side of the front-end:
//! - OAuth2 authorization-code flow (authorize URL, code exchange, refresh)
//! - A `reqwest` client for the handful of Web API endpoints the UI uses
//! - The `MusicApi` trait handlers depend on, plus an in-memory mock

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod model;
pub mod token;

pub use api::{BoxFuture, DynMusicApi, Endpoint, MockCall, MockFailure, MockMusicApi, MusicApi};
pub use auth::{Authenticator, AuthenticatorConfig, CallbackParams, DEFAULT_ACCOUNTS_URL, SCOPES};
pub use client::{SpotifyClient, DEFAULT_API_URL};
pub use error::{SpotifyError, SpotifyResult};
pub use model::{
    Album, Artist, CurrentlyPlaying, Image, PlaybackContext, Playlist, RecentlyPlayedItem,
    SimpleArtist, Track,
};
pub use token::OAuthToken;
