//! RPC handlers.
//!
//! Each handler runs on its own task behind `Star::stream` and answers by
//! writing fragment patches, toasts and at most one signals patch.

use std::future::Future;

use axum::extract::State;
use axum::response::Response;
use axum::Extension;
use serde::Serialize;
use spotigo_spotify::{DynMusicApi, Playlist, SpotifyError, Track};
use spotigo_star::{RpcParams, Star, StarWriter};
use tracing::{debug, error, info, warn};

use crate::session::Session;
use crate::signals::{QueueTrackSignals, SpotigoSignals};
use crate::state::AppState;
use crate::views::{
    detailed_track_info, track_card, track_card_empty, track_list, DetailedTrackProps, ShowToast,
};

/// Per-request dependencies of an RPC handler.
#[derive(Clone)]
pub struct RpcContext {
    pub api: DynMusicApi,
    pub login_path: String,
}

impl RpcContext {
    pub fn new(api: DynMusicApi, login_path: impl Into<String>) -> Self {
        Self {
            api,
            login_path: login_path.into(),
        }
    }

    /// Log an upstream failure and send the client to login if the
    /// session can no longer reach Spotify.
    pub fn handle_upstream_error<S: Serialize>(
        &self,
        w: &StarWriter<S>,
        err: &SpotifyError,
        what: &str,
    ) {
        error!(error = %err, "Failed to {}", what);
        if err.is_unauthorized() {
            w.redirect(&self.login_path);
        }
    }
}

/// `POST /rpc/get-playing-song`
pub async fn get_playing_song(
    ctx: RpcContext,
    w: StarWriter<SpotigoSignals>,
    mut signals: SpotigoSignals,
    _params: RpcParams,
) {
    let (playing_id, ()) = tokio::join!(
        async {
            let playing = match ctx.api.currently_playing().await {
                Ok(playing) => playing,
                Err(e) => {
                    ctx.handle_upstream_error(&w, &e, "get currently playing song");
                    return None;
                }
            };

            match playing.and_then(|p| p.item) {
                Some(track) => {
                    w.replace_inner("#playing-song", track_card(&track));
                    Some(track.id)
                }
                None => {
                    w.replace_inner("#playing-song", track_card_empty());
                    None
                }
            }
        },
        async {
            match ctx.api.recently_played().await {
                Ok(items) => {
                    let tracks: Vec<Track> = items.into_iter().map(|item| item.track).collect();
                    w.replace(
                        "#recent-songs",
                        track_list(Some("recent-songs"), Some("recent_songs"), &tracks),
                    );
                }
                Err(e) => ctx.handle_upstream_error(&w, &e, "get recently played songs"),
            }
        },
    );

    if signals.selected_song.is_empty() {
        if let Some(id) = playing_id {
            signals.selected_song = id;
        }
    }

    w.update_signals(&signals);
}

/// Track ids from the `track_id` parameter, falling back to `selection`.
fn requested_ids(params: &RpcParams, selection: impl FnOnce() -> Vec<String>) -> Vec<String> {
    match params.value("track_id") {
        Some(id) => vec![id.to_string()],
        None => selection(),
    }
}

/// `POST /rpc/queue-track`
pub async fn queue_track(
    ctx: RpcContext,
    w: StarWriter<QueueTrackSignals>,
    signals: QueueTrackSignals,
    params: RpcParams,
) {
    let ids = requested_ids(&params, || signals.selected_ids());
    if ids.is_empty() {
        warn!("Queue requested without any tracks");
        w.show_toast("No tracks specified", "Select at least one song to queue.");
        return;
    }

    let mut queued = Vec::new();
    for id in &ids {
        let track = match ctx.api.track(id).await {
            Ok(track) => track,
            Err(e) => {
                ctx.handle_upstream_error(&w, &e, "get track");
                if e.is_unauthorized() {
                    return;
                }
                continue;
            }
        };

        if let Err(e) = ctx.api.queue(&track.id).await {
            ctx.handle_upstream_error(&w, &e, "queue song");
            if e.is_unauthorized() {
                return;
            }
            continue;
        }

        debug!(track_id = %track.id, "Queued track");
        queued.push(track.name);
    }

    info!(requested = ids.len(), queued = queued.len(), "Queue request finished");
    let (title, description) = queue_summary(&queued, ids.len());
    w.show_toast(&title, &description);
}

fn queue_summary(queued: &[String], total: usize) -> (String, String) {
    let failed = total - queued.len();
    match (queued, failed) {
        ([name], 0) => (
            format!("Queued {name}"),
            "You can now enjoy this song in your queue.".to_string(),
        ),
        (_, 0) => (
            format!("Queued {total} songs"),
            "All songs have been added to your queue.".to_string(),
        ),
        ([], _) => (
            "Failed to queue songs".to_string(),
            "All tracks failed to be added to queue.".to_string(),
        ),
        (_, failed) => (
            format!("Queued {}/{total} songs", queued.len()),
            format!("{failed} songs failed to queue"),
        ),
    }
}

/// `POST /rpc/add-to-playlist`
pub async fn add_to_playlist(
    ctx: RpcContext,
    w: StarWriter<SpotigoSignals>,
    signals: SpotigoSignals,
    params: RpcParams,
) {
    let ids = requested_ids(&params, || {
        let listed = params.all("track_ids[]");
        if listed.is_empty() {
            signals.selected_ids()
        } else {
            listed
        }
    });
    if ids.is_empty() {
        warn!("Add to playlist requested without any tracks");
        w.show_toast("No tracks specified", "Select at least one song to add.");
        return;
    }

    let Some(playlist) = target_playlist(&ctx, &w).await else {
        return;
    };

    let mut valid: Vec<Track> = Vec::with_capacity(ids.len());
    for id in &ids {
        match ctx.api.track(id).await {
            Ok(track) => valid.push(track),
            Err(e) => {
                ctx.handle_upstream_error(&w, &e, "get track");
                if e.is_unauthorized() {
                    return;
                }
            }
        }
    }

    let mut added: Vec<String> = Vec::new();
    if !valid.is_empty() {
        let track_ids: Vec<String> = valid.iter().map(|t| t.id.clone()).collect();
        match ctx
            .api
            .add_tracks_to_playlist(&playlist.id, &track_ids)
            .await
        {
            Ok(snapshot) => {
                debug!(playlist_id = %playlist.id, snapshot = %snapshot, "Added tracks to playlist");
                added = valid.into_iter().map(|t| t.name).collect();
            }
            Err(e) => {
                ctx.handle_upstream_error(&w, &e, "add tracks to playlist");
                if e.is_unauthorized() {
                    return;
                }
            }
        }
    }

    info!(
        playlist_id = %playlist.id,
        requested = ids.len(),
        added = added.len(),
        "Add to playlist finished"
    );
    let (title, description) = playlist_summary(&added, ids.len(), &playlist.name);
    w.show_toast(&title, &description);
}

/// Playlist being played from, else the user's first playlist.
///
/// Returns `None` after informing the client when there is no usable target.
async fn target_playlist<S: Serialize>(ctx: &RpcContext, w: &StarWriter<S>) -> Option<Playlist> {
    let playing = match ctx.api.currently_playing().await {
        Ok(playing) => playing,
        Err(e) => {
            ctx.handle_upstream_error(w, &e, "get currently playing song");
            return None;
        }
    };

    let context = playing
        .and_then(|p| p.context)
        .filter(|context| context.is_playlist());

    if let Some(context) = context {
        let Some(id) = context.playlist_id() else {
            warn!(uri = %context.uri, "Playback context is not a playlist URI");
            w.show_toast("Invalid playlist context", "Unable to determine current playlist.");
            return None;
        };

        return match ctx.api.playlist(id).await {
            Ok(playlist) => Some(playlist),
            Err(e) => {
                ctx.handle_upstream_error(w, &e, "get playlist details");
                None
            }
        };
    }

    match ctx.api.current_user_playlists().await {
        Ok(playlists) => {
            let first = playlists.into_iter().next();
            if first.is_none() {
                w.show_toast(
                    "No playlists found",
                    "Please create a playlist first to add songs to it.",
                );
            }
            first
        }
        Err(e) => {
            ctx.handle_upstream_error(w, &e, "get playlists");
            None
        }
    }
}

fn playlist_summary(added: &[String], total: usize, playlist: &str) -> (String, String) {
    let failed = total - added.len();
    match (added, failed) {
        ([name], 0) => (
            format!("Added {name} to {playlist}"),
            "The song has been added to your playlist.".to_string(),
        ),
        (_, 0) => (
            format!("Added {total} songs to {playlist}"),
            "All songs have been added to your playlist.".to_string(),
        ),
        ([], _) => (
            "Failed to add songs to playlist".to_string(),
            format!("No tracks could be added to {playlist}."),
        ),
        (_, failed) => (
            format!("Added {}/{total} songs to {playlist}", added.len()),
            format!("{failed} songs failed to add"),
        ),
    }
}

/// `POST /rpc/update-selected-song`
pub async fn update_selected_song(
    ctx: RpcContext,
    w: StarWriter<SpotigoSignals>,
    signals: SpotigoSignals,
    _params: RpcParams,
) {
    if signals.selected_song.is_empty() {
        debug!("No song selected");
        return;
    }

    let track = match ctx.api.track(&signals.selected_song).await {
        Ok(track) => track,
        Err(e) => {
            ctx.handle_upstream_error(&w, &e, "get selected track");
            return;
        }
    };

    w.replace_inner("#selected-song", track_card(&track));

    let seeds = [track.id];
    match ctx.api.recommendations(&seeds).await {
        Ok(tracks) => w.replace(
            "#recommended-songs",
            track_list(Some("recommended-songs"), Some("recommended_songs"), &tracks),
        ),
        Err(e) => ctx.handle_upstream_error(&w, &e, "get recommendations"),
    }
}

/// `POST /rpc/get-top-songs`
pub async fn get_top_songs(
    ctx: RpcContext,
    w: StarWriter<SpotigoSignals>,
    _signals: SpotigoSignals,
    _params: RpcParams,
) {
    match ctx.api.top_tracks().await {
        Ok(tracks) => w.replace_inner("#top-songs", track_list(None, None, &tracks)),
        Err(e) => error!(error = %e, "Failed to get top songs"),
    }
}

/// `POST /rpc/get-detailed-track-info`
pub async fn get_detailed_track_info(
    ctx: RpcContext,
    w: StarWriter<SpotigoSignals>,
    mut signals: SpotigoSignals,
    params: RpcParams,
) {
    let Some(track_id) = params.value("track_id") else {
        warn!("No track id provided for track details");
        return;
    };

    let track = match ctx.api.track(track_id).await {
        Ok(track) => track,
        Err(e) => {
            error!(error = %e, track_id, "Failed to get track details");
            return;
        }
    };

    let artist = match track.artists.first() {
        Some(first) => match ctx.api.artist(&first.id).await {
            Ok(artist) => Some(artist),
            Err(e) => {
                warn!(error = %e, artist_id = %first.id, "Failed to get artist details");
                None
            }
        },
        None => None,
    };

    let props = DetailedTrackProps::new(&track, artist.as_ref());

    signals.dialog_open = true;
    signals.dialog_type = "track".to_string();
    signals.dialog_item_id = track_id.to_string();
    w.update_signals(&signals);
    w.replace_inner("#dialog-content", detailed_track_info(&props));
}

/// Decode, spawn and stream one RPC call.
fn serve<T, F, Fut>(state: &AppState, session: &Session, star: Star<T>, handler: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(RpcContext, StarWriter<T>, T, RpcParams) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let ctx = RpcContext::new(state.api_for(session), state.config.login_path.clone());
    star.stream(move |w, signals, params| handler(ctx, w, signals, params))
}

pub async fn get_playing_song_route(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    star: Star<SpotigoSignals>,
) -> Response {
    serve(&state, &session, star, get_playing_song)
}

pub async fn queue_track_route(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    star: Star<QueueTrackSignals>,
) -> Response {
    serve(&state, &session, star, queue_track)
}

pub async fn add_to_playlist_route(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    star: Star<SpotigoSignals>,
) -> Response {
    serve(&state, &session, star, add_to_playlist)
}

pub async fn update_selected_song_route(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    star: Star<SpotigoSignals>,
) -> Response {
    serve(&state, &session, star, update_selected_song)
}

pub async fn get_top_songs_route(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    star: Star<SpotigoSignals>,
) -> Response {
    serve(&state, &session, star, get_top_songs)
}

pub async fn get_detailed_track_info_route(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    star: Star<SpotigoSignals>,
) -> Response {
    serve(&state, &session, star, get_detailed_track_info)
}
