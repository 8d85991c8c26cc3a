//! Music service trait used by the request handlers.
//!
//! Handlers depend on `MusicApi` rather than on `SpotifyClient` so they can
//! be exercised against `MockMusicApi` in tests.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::StatusCode;

use crate::client::SpotifyClient;
use crate::error::{SpotifyError, SpotifyResult};
use crate::model::{Artist, CurrentlyPlaying, Playlist, RecentlyPlayedItem, Track};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Upstream operations the front-end needs.
pub trait MusicApi: Send + Sync {
    /// Currently playing item. `Ok(None)` when the player is idle.
    fn currently_playing(&self) -> BoxFuture<'_, SpotifyResult<Option<CurrentlyPlaying>>>;

    fn recently_played(&self) -> BoxFuture<'_, SpotifyResult<Vec<RecentlyPlayedItem>>>;

    fn track<'a>(&'a self, id: &'a str) -> BoxFuture<'a, SpotifyResult<Track>>;

    /// Add a track to the end of the user's playback queue.
    fn queue<'a>(&'a self, track_id: &'a str) -> BoxFuture<'a, SpotifyResult<()>>;

    fn current_user_playlists(&self) -> BoxFuture<'_, SpotifyResult<Vec<Playlist>>>;

    fn playlist<'a>(&'a self, id: &'a str) -> BoxFuture<'a, SpotifyResult<Playlist>>;

    /// Append tracks to a playlist in one call. Returns the snapshot id.
    fn add_tracks_to_playlist<'a>(
        &'a self,
        playlist_id: &'a str,
        track_ids: &'a [String],
    ) -> BoxFuture<'a, SpotifyResult<String>>;

    fn recommendations<'a>(&'a self, seed_tracks: &'a [String])
        -> BoxFuture<'a, SpotifyResult<Vec<Track>>>;

    fn top_tracks(&self) -> BoxFuture<'_, SpotifyResult<Vec<Track>>>;

    fn artist<'a>(&'a self, id: &'a str) -> BoxFuture<'a, SpotifyResult<Artist>>;
}

/// Arc wrapper for MusicApi trait objects.
pub type DynMusicApi = Arc<dyn MusicApi>;

impl MusicApi for SpotifyClient {
    fn currently_playing(&self) -> BoxFuture<'_, SpotifyResult<Option<CurrentlyPlaying>>> {
        Box::pin(SpotifyClient::currently_playing(self))
    }

    fn recently_played(&self) -> BoxFuture<'_, SpotifyResult<Vec<RecentlyPlayedItem>>> {
        Box::pin(SpotifyClient::recently_played(self))
    }

    fn track<'a>(&'a self, id: &'a str) -> BoxFuture<'a, SpotifyResult<Track>> {
        Box::pin(SpotifyClient::track(self, id))
    }

    fn queue<'a>(&'a self, track_id: &'a str) -> BoxFuture<'a, SpotifyResult<()>> {
        Box::pin(SpotifyClient::queue(self, track_id))
    }

    fn current_user_playlists(&self) -> BoxFuture<'_, SpotifyResult<Vec<Playlist>>> {
        Box::pin(SpotifyClient::current_user_playlists(self))
    }

    fn playlist<'a>(&'a self, id: &'a str) -> BoxFuture<'a, SpotifyResult<Playlist>> {
        Box::pin(SpotifyClient::playlist(self, id))
    }

    fn add_tracks_to_playlist<'a>(
        &'a self,
        playlist_id: &'a str,
        track_ids: &'a [String],
    ) -> BoxFuture<'a, SpotifyResult<String>> {
        Box::pin(SpotifyClient::add_tracks_to_playlist(
            self,
            playlist_id,
            track_ids,
        ))
    }

    fn recommendations<'a>(
        &'a self,
        seed_tracks: &'a [String],
    ) -> BoxFuture<'a, SpotifyResult<Vec<Track>>> {
        Box::pin(SpotifyClient::recommendations(self, seed_tracks))
    }

    fn top_tracks(&self) -> BoxFuture<'_, SpotifyResult<Vec<Track>>> {
        Box::pin(SpotifyClient::top_tracks(self))
    }

    fn artist<'a>(&'a self, id: &'a str) -> BoxFuture<'a, SpotifyResult<Artist>> {
        Box::pin(SpotifyClient::artist(self, id))
    }
}

/// Upstream operation, used to configure and inspect `MockMusicApi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    CurrentlyPlaying,
    RecentlyPlayed,
    Track,
    Queue,
    CurrentUserPlaylists,
    Playlist,
    AddTracksToPlaylist,
    Recommendations,
    TopTracks,
    Artist,
}

/// Failure injected into a `MockMusicApi` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Behaves like an expired or revoked token (HTTP 401).
    Unauthorized,
    /// Behaves like a transient upstream failure (HTTP 502).
    Upstream,
}

impl MockFailure {
    fn to_error(self) -> SpotifyError {
        match self {
            MockFailure::Unauthorized => SpotifyError::Unauthorized,
            MockFailure::Upstream => SpotifyError::Status {
                status: StatusCode::BAD_GATEWAY,
                body: "mock upstream failure".to_string(),
            },
        }
    }
}

/// A call recorded by `MockMusicApi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub endpoint: Endpoint,
    pub args: Vec<String>,
}

/// In-memory `MusicApi` for tests.
///
/// Configure with the `with_*` builders, then share behind an `Arc`.
/// Unknown track, artist and playlist ids answer HTTP 404.
#[derive(Debug, Default)]
pub struct MockMusicApi {
    tracks: HashMap<String, Track>,
    artists: HashMap<String, Artist>,
    playlists: Vec<Playlist>,
    currently_playing: Option<CurrentlyPlaying>,
    recently_played: Vec<RecentlyPlayedItem>,
    recommendations: Vec<Track>,
    top_tracks: Vec<Track>,
    failures: HashMap<Endpoint, MockFailure>,
    /// Track ids that fail `track()` with a 404 even if known.
    missing_tracks: Vec<String>,
    /// Track ids whose `track()` and `queue()` calls fail.
    track_failures: HashMap<String, MockFailure>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockMusicApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.insert(track.id.clone(), track);
        self
    }

    pub fn with_artist(mut self, artist: Artist) -> Self {
        self.artists.insert(artist.id.clone(), artist);
        self
    }

    /// Add a playlist owned by the current user.
    pub fn with_playlist(mut self, playlist: Playlist) -> Self {
        self.playlists.push(playlist);
        self
    }

    pub fn with_currently_playing(mut self, playing: CurrentlyPlaying) -> Self {
        self.currently_playing = Some(playing);
        self
    }

    pub fn with_recently_played(mut self, tracks: Vec<Track>) -> Self {
        self.recently_played = tracks
            .into_iter()
            .map(|track| RecentlyPlayedItem {
                track,
                played_at: String::new(),
            })
            .collect();
        self
    }

    pub fn with_recommendations(mut self, tracks: Vec<Track>) -> Self {
        self.recommendations = tracks;
        self
    }

    pub fn with_top_tracks(mut self, tracks: Vec<Track>) -> Self {
        self.top_tracks = tracks;
        self
    }

    pub fn with_failure(mut self, endpoint: Endpoint, failure: MockFailure) -> Self {
        self.failures.insert(endpoint, failure);
        self
    }

    pub fn with_missing_track(mut self, id: impl Into<String>) -> Self {
        self.missing_tracks.push(id.into());
        self
    }

    /// Fail `track()` and `queue()` for one track id only.
    pub fn with_track_failure(mut self, id: impl Into<String>, failure: MockFailure) -> Self {
        self.track_failures.insert(id.into(), failure);
        self
    }

    /// All recorded calls in call order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    /// Track ids passed to `queue`, in order.
    pub fn queued(&self) -> Vec<String> {
        self.args_of(Endpoint::Queue)
            .into_iter()
            .flatten()
            .collect()
    }

    /// Arguments of every call to `endpoint`.
    pub fn args_of(&self, endpoint: Endpoint) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .map(|c| c.args.clone())
            .collect()
    }

    fn record(&self, endpoint: Endpoint, args: Vec<String>) -> SpotifyResult<()> {
        self.calls.lock().push(MockCall { endpoint, args });
        match self.failures.get(&endpoint) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    fn fail_track(&self, id: &str) -> SpotifyResult<()> {
        match self.track_failures.get(id) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

fn not_found(what: &str, id: &str) -> SpotifyError {
    SpotifyError::Status {
        status: StatusCode::NOT_FOUND,
        body: format!("{what} {id} not found"),
    }
}

impl MusicApi for MockMusicApi {
    fn currently_playing(&self) -> BoxFuture<'_, SpotifyResult<Option<CurrentlyPlaying>>> {
        Box::pin(async move {
            self.record(Endpoint::CurrentlyPlaying, Vec::new())?;
            Ok(self.currently_playing.clone())
        })
    }

    fn recently_played(&self) -> BoxFuture<'_, SpotifyResult<Vec<RecentlyPlayedItem>>> {
        Box::pin(async move {
            self.record(Endpoint::RecentlyPlayed, Vec::new())?;
            Ok(self.recently_played.clone())
        })
    }

    fn track<'a>(&'a self, id: &'a str) -> BoxFuture<'a, SpotifyResult<Track>> {
        Box::pin(async move {
            self.record(Endpoint::Track, vec![id.to_string()])?;
            self.fail_track(id)?;
            if self.missing_tracks.iter().any(|m| m == id) {
                return Err(not_found("track", id));
            }
            self.tracks
                .get(id)
                .cloned()
                .ok_or_else(|| not_found("track", id))
        })
    }

    fn queue<'a>(&'a self, track_id: &'a str) -> BoxFuture<'a, SpotifyResult<()>> {
        Box::pin(async move {
            self.record(Endpoint::Queue, vec![track_id.to_string()])?;
            self.fail_track(track_id)
        })
    }

    fn current_user_playlists(&self) -> BoxFuture<'_, SpotifyResult<Vec<Playlist>>> {
        Box::pin(async move {
            self.record(Endpoint::CurrentUserPlaylists, Vec::new())?;
            Ok(self.playlists.clone())
        })
    }

    fn playlist<'a>(&'a self, id: &'a str) -> BoxFuture<'a, SpotifyResult<Playlist>> {
        Box::pin(async move {
            self.record(Endpoint::Playlist, vec![id.to_string()])?;
            self.playlists
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| not_found("playlist", id))
        })
    }

    fn add_tracks_to_playlist<'a>(
        &'a self,
        playlist_id: &'a str,
        track_ids: &'a [String],
    ) -> BoxFuture<'a, SpotifyResult<String>> {
        Box::pin(async move {
            let mut args = vec![playlist_id.to_string()];
            args.extend(track_ids.iter().cloned());
            self.record(Endpoint::AddTracksToPlaylist, args)?;
            Ok("mock-snapshot".to_string())
        })
    }

    fn recommendations<'a>(
        &'a self,
        seed_tracks: &'a [String],
    ) -> BoxFuture<'a, SpotifyResult<Vec<Track>>> {
        Box::pin(async move {
            self.record(Endpoint::Recommendations, seed_tracks.to_vec())?;
            Ok(self.recommendations.clone())
        })
    }

    fn top_tracks(&self) -> BoxFuture<'_, SpotifyResult<Vec<Track>>> {
        Box::pin(async move {
            self.record(Endpoint::TopTracks, Vec::new())?;
            Ok(self.top_tracks.clone())
        })
    }

    fn artist<'a>(&'a self, id: &'a str) -> BoxFuture<'a, SpotifyResult<Artist>> {
        Box::pin(async move {
            self.record(Endpoint::Artist, vec![id.to_string()])?;
            self.artists
                .get(id)
                .cloned()
                .ok_or_else(|| not_found("artist", id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            name: format!("Track {id}"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mock_records_calls_in_order() {
        let api = MockMusicApi::new().with_track(track("a"));
        api.track("a").await.unwrap();
        api.queue("a").await.unwrap();
        api.queue("a").await.unwrap();

        assert_eq!(api.call_count(Endpoint::Track), 1);
        assert_eq!(api.queued(), vec!["a".to_string(), "a".to_string()]);
        assert_eq!(api.calls()[0].endpoint, Endpoint::Track);
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let api = MockMusicApi::new()
            .with_top_tracks(vec![track("a")])
            .with_failure(Endpoint::TopTracks, MockFailure::Unauthorized);

        let err = api.top_tracks().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(api.call_count(Endpoint::TopTracks), 1);
    }

    #[tokio::test]
    async fn test_mock_track_failure_hits_one_id() {
        let api = MockMusicApi::new()
            .with_track(track("a"))
            .with_track(track("b"))
            .with_track_failure("b", MockFailure::Unauthorized);

        api.track("a").await.unwrap();
        api.queue("a").await.unwrap();
        assert!(api.track("b").await.unwrap_err().is_unauthorized());
        assert!(api.queue("b").await.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn test_mock_unknown_track_is_not_found() {
        let api: DynMusicApi = Arc::new(MockMusicApi::new());
        match api.track("nope").await.unwrap_err() {
            SpotifyError::Status { status, .. } => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
