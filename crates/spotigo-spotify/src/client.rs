//! HTTP client for the Spotify Web API.
//!
//! Covers only the endpoints the front-end calls. Every request carries the
//! session's bearer token; an expired token is refreshed once per client
//! before the first request that needs it.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::auth::Authenticator;
use crate::error::{SpotifyError, SpotifyResult};
use crate::model::{
    Artist, CurrentlyPlaying, Page, Playlist, RecentlyPlayedItem, Recommendations,
    SnapshotResponse, Track,
};
use crate::token::OAuthToken;

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Body of `POST /playlists/{id}/tracks`.
#[derive(Debug, Serialize)]
struct AddTracksRequest {
    uris: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<u32>,
}

/// Spotify Web API client bound to one user's token.
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    token: Mutex<OAuthToken>,
    /// Used to refresh expired tokens. `None` disables refreshing.
    authenticator: Option<Authenticator>,
}

impl SpotifyClient {
    pub(crate) fn new(
        http: Client,
        api_url: String,
        token: OAuthToken,
        authenticator: Option<Authenticator>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: Mutex::new(token),
            authenticator,
        }
    }

    /// Client with a fixed token and no refresh support.
    pub fn with_token(api_url: impl Into<String>, token: OAuthToken) -> SpotifyResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| SpotifyError::Http(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self::new(http, api_url.into(), token, None))
    }

    /// `Authorization` header value, refreshing the token if it has expired.
    async fn authorization(&self) -> SpotifyResult<String> {
        let mut token = self.token.lock().await;

        if token.is_expired() {
            match &self.authenticator {
                Some(auth) => {
                    *token = auth.refresh(&token).await?;
                }
                None => {
                    warn!("Access token expired and no authenticator is available");
                    return Err(SpotifyError::Unauthorized);
                }
            }
        }

        Ok(token.authorization())
    }

    async fn request(&self, method: Method, path: &str) -> SpotifyResult<RequestBuilder> {
        let authorization = self.authorization().await?;
        let url = format!("{}{}", self.api_url, path);
        debug!(%method, %url, "Spotify API request");

        Ok(self
            .http
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, authorization))
    }

    /// Send a request and map HTTP failures.
    ///
    /// Returns `None` for `204 No Content`.
    async fn send(&self, builder: RequestBuilder) -> SpotifyResult<Option<reqwest::Response>> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(SpotifyError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpotifyError::Status { status, body });
        }

        Ok(Some(response))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> SpotifyResult<Option<T>> {
        let builder = self.request(Method::GET, path).await?.query(query);
        match self.send(builder).await? {
            Some(response) => {
                let bytes = response.bytes().await?;
                // Some endpoints answer 200 with an empty body instead of 204.
                if bytes.is_empty() {
                    return Ok(None);
                }
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            None => Ok(None),
        }
    }

    async fn get_required<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> SpotifyResult<T> {
        self.get_json(path, query)
            .await?
            .ok_or_else(|| SpotifyError::Decode(format!("empty response from {path}")))
    }

    /// `GET /me/player/currently-playing`. `None` when nothing is playing.
    pub async fn currently_playing(&self) -> SpotifyResult<Option<CurrentlyPlaying>> {
        self.get_json("/me/player/currently-playing", &[]).await
    }

    /// `GET /me/player/recently-played`.
    pub async fn recently_played(&self) -> SpotifyResult<Vec<RecentlyPlayedItem>> {
        let page: Page<RecentlyPlayedItem> =
            self.get_required("/me/player/recently-played", &[]).await?;
        Ok(page.items)
    }

    /// `GET /tracks/{id}`.
    pub async fn track(&self, id: &str) -> SpotifyResult<Track> {
        self.get_required(&format!("/tracks/{id}"), &[]).await
    }

    /// `POST /me/player/queue?uri=spotify:track:{id}`.
    pub async fn queue(&self, track_id: &str) -> SpotifyResult<()> {
        let uri = track_uri(track_id);
        let builder = self
            .request(Method::POST, "/me/player/queue")
            .await?
            .query(&[("uri", uri.as_str())]);
        self.send(builder).await?;
        Ok(())
    }

    /// `GET /me/playlists`.
    pub async fn current_user_playlists(&self) -> SpotifyResult<Vec<Playlist>> {
        let page: Page<Playlist> = self.get_required("/me/playlists", &[]).await?;
        Ok(page.items)
    }

    /// `GET /playlists/{id}`.
    pub async fn playlist(&self, id: &str) -> SpotifyResult<Playlist> {
        self.get_required(&format!("/playlists/{id}"), &[("fields", "id,name")])
            .await
    }

    /// `POST /playlists/{id}/tracks`. Returns the new snapshot id.
    pub async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> SpotifyResult<String> {
        let body = AddTracksRequest {
            uris: track_ids.iter().map(|id| track_uri(id)).collect(),
            position: None,
        };
        let builder = self
            .request(Method::POST, &format!("/playlists/{playlist_id}/tracks"))
            .await?
            .json(&body);

        match self.send(builder).await? {
            Some(response) => Ok(response.json::<SnapshotResponse>().await?.snapshot_id),
            None => Ok(String::new()),
        }
    }

    /// `GET /recommendations?seed_tracks=...`.
    pub async fn recommendations(&self, seed_tracks: &[String]) -> SpotifyResult<Vec<Track>> {
        let seeds = seed_tracks.join(",");
        let response: Recommendations = self
            .get_required("/recommendations", &[("seed_tracks", seeds.as_str())])
            .await?;
        Ok(response.tracks)
    }

    /// `GET /me/top/tracks`.
    pub async fn top_tracks(&self) -> SpotifyResult<Vec<Track>> {
        let page: Page<Track> = self.get_required("/me/top/tracks", &[]).await?;
        Ok(page.items)
    }

    /// `GET /artists/{id}`.
    pub async fn artist(&self, id: &str) -> SpotifyResult<Artist> {
        self.get_required(&format!("/artists/{id}"), &[]).await
    }
}

impl std::fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("api_url", &self.api_url)
            .field("can_refresh", &self.authenticator.is_some())
            .finish()
    }
}

fn track_uri(id: &str) -> String {
    if id.starts_with("spotify:track:") {
        id.to_string()
    } else {
        format!("spotify:track:{id}")
    }
}
