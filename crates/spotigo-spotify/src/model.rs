//! Web API object types.
//!
//! Only the fields the front-end renders are modelled. Unknown fields are
//! ignored and most fields default so that simplified and full objects
//! deserialize into the same types.

use serde::{Deserialize, Deserializer, Serialize};

/// Treat JSON `null` like a missing field. Local files carry `"id": null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Cover art or artist image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Artist as embedded in track objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleArtist {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    pub name: String,
}

/// Full artist object (`GET /artists/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD` depending on precision.
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
}

impl Album {
    /// URL of the largest cover image, if any.
    pub fn cover_url(&self) -> Option<&str> {
        self.images.first().map(|i| i.url.as_str())
    }
}

/// Track object. Album is absent on some simplified responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uri: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub artists: Vec<SimpleArtist>,
    #[serde(default)]
    pub album: Option<Album>,
}

impl Track {
    /// Comma separated artist names.
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn album_name(&self) -> &str {
        self.album.as_ref().map(|a| a.name.as_str()).unwrap_or("")
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.album.as_ref().and_then(Album::cover_url)
    }
}

/// Context the player is playing from (playlist, album, artist, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackContext {
    #[serde(rename = "type")]
    pub context_type: String,
    pub uri: String,
}

impl PlaybackContext {
    /// Playlist id from a `spotify:playlist:<id>` URI.
    ///
    /// Returns `None` for any other URI shape.
    pub fn playlist_id(&self) -> Option<&str> {
        let mut parts = self.uri.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("spotify"), Some("playlist"), Some(id), None) if !id.is_empty() => Some(id),
            _ => None,
        }
    }

    pub fn is_playlist(&self) -> bool {
        self.context_type == "playlist"
    }
}

/// `GET /me/player/currently-playing`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    /// `None` when nothing is playing or an episode/ad is playing.
    #[serde(default)]
    pub item: Option<Track>,
    #[serde(default)]
    pub context: Option<PlaybackContext>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentlyPlayedItem {
    pub track: Track,
    #[serde(default, deserialize_with = "null_as_default")]
    pub played_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
}

/// Paging wrapper used by list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Recommendations {
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SnapshotResponse {
    pub snapshot_id: String,
}
