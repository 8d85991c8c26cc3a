//! HTML views.
//!
//! Every function returns a complete fragment as a `String`. All text taken
//! from upstream data or signals goes through `escape`.

use std::fmt::Write as _;

use serde::Serialize;
use spotigo_spotify::{Artist, Track};
use spotigo_star::{escape_js_single_quoted, rpc, StarWriter};

use crate::signals::SpotigoSignals;

const DATASTAR_SCRIPT: &str =
    "https://cdn.jsdelivr.net/gh/starfederation/datastar@1.0.0-RC.5/bundles/datastar.js";

/// Escape text for use in element content and double-quoted attributes.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Milliseconds as `m:ss`.
pub fn format_duration(duration_ms: u64) -> String {
    let total_secs = duration_ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

fn cover(url: Option<&str>, class: &str) -> String {
    match url {
        Some(url) => format!(
            "<img class=\"{class}\" src=\"{}\" alt=\"\" loading=\"lazy\">",
            escape(url)
        ),
        None => format!("<div class=\"{class} {class}--placeholder\"></div>"),
    }
}

/// Card for a single track.
pub fn track_card(track: &Track) -> String {
    let queue = rpc::post("queue-track").param("track_id", &track.id);
    let add = rpc::post("add-to-playlist").param("track_id", &track.id);
    let details = rpc::post("get-detailed-track-info")
        .param("track_id", &track.id)
        .exclude("/^(recent|recommended)_songs$/");

    format!(
        r#"<div class="track-card" data-track-id="{id}">
  {cover}
  <div class="track-card__body">
    <h3 class="track-card__name">{name}</h3>
    <p class="track-card__artists">{artists}</p>
    <p class="track-card__album">{album}</p>
  </div>
  <div class="track-card__actions">
    <button type="button" data-on-click="{queue}">Queue</button>
    <button type="button" data-on-click="{add}">Add to playlist</button>
    <button type="button" data-on-click="{details}">Details</button>
  </div>
</div>"#,
        id = escape(&track.id),
        cover = cover(track.cover_url(), "track-card__cover"),
        name = escape(&track.name),
        artists = escape(&track.artist_names()),
        album = escape(track.album_name()),
        queue = escape(&queue.build()),
        add = escape(&add.build()),
        details = escape(&details.build()),
    )
}

/// Placeholder card shown when nothing is playing.
pub fn track_card_empty() -> String {
    r#"<div class="track-card track-card--empty">
  <div class="track-card__cover track-card__cover--placeholder"></div>
  <div class="track-card__body">
    <h3 class="track-card__name">Nothing playing</h3>
    <p class="track-card__artists">Start playback on any device to see it here.</p>
  </div>
</div>"#
        .to_string()
}

/// List of tracks.
///
/// With `id` the list can be targeted by an outer patch. With `signal` each
/// row gets a checkbox bound to that array signal.
pub fn track_list(id: Option<&str>, signal: Option<&str>, tracks: &[Track]) -> String {
    let mut out = String::new();
    match id {
        Some(id) => {
            let _ = writeln!(out, "<ul class=\"track-list\" id=\"{}\">", escape(id));
        }
        None => out.push_str("<ul class=\"track-list\">\n"),
    }

    for track in tracks {
        let id = escape(&track.id);
        // Quoted for the JS expression first, then for the attribute.
        let selected = escape(&escape_js_single_quoted(&track.id));
        out.push_str("  <li class=\"track-list__item\">\n");
        if let Some(signal) = signal {
            let _ = writeln!(
                out,
                "    <input type=\"checkbox\" value=\"{id}\" data-bind=\"{}\">",
                escape(signal)
            );
        }
        let _ = writeln!(
            out,
            "    <button type=\"button\" class=\"track-list__select\" data-on-click=\"$selected_song = &#39;{selected}&#39;\">"
        );
        let _ = writeln!(out, "      {}", cover(track.cover_url(), "track-list__cover"));
        let _ = writeln!(
            out,
            "      <span class=\"track-list__name\">{}</span>",
            escape(&track.name)
        );
        let _ = writeln!(
            out,
            "      <span class=\"track-list__artists\">{}</span>",
            escape(&track.artist_names())
        );
        out.push_str("    </button>\n  </li>\n");
    }

    out.push_str("</ul>");
    out
}

pub fn toast(title: &str, description: &str) -> String {
    format!(
        r#"<div class="toast" role="status" data-on-load="setTimeout(() => el.remove(), 5000)">
  <p class="toast__title">{}</p>
  <p class="toast__description">{}</p>
</div>"#,
        escape(title),
        escape(description)
    )
}

/// Shows toasts through a `StarWriter`.
pub trait ShowToast {
    fn show_toast(&self, title: &str, description: &str);
}

impl<S: Serialize> ShowToast for StarWriter<S> {
    fn show_toast(&self, title: &str, description: &str) {
        self.append("#toasts", toast(title, description));
    }
}

/// Everything the track details dialog shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailedTrackProps {
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub album_image: Option<String>,
    pub duration: String,
    pub popularity: u32,
    pub release_date: String,
    pub genres: Vec<String>,
}

impl DetailedTrackProps {
    /// `artist` is the track's first artist, when it could be fetched.
    pub fn new(track: &Track, artist: Option<&Artist>) -> Self {
        let album = track.album.as_ref();
        Self {
            track_id: track.id.clone(),
            track_name: track.name.clone(),
            artist_name: track
                .artists
                .first()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            album_name: track.album_name().to_string(),
            album_image: track.cover_url().map(str::to_string),
            duration: format_duration(track.duration_ms),
            popularity: track.popularity,
            release_date: album.map(|a| a.release_date.clone()).unwrap_or_default(),
            genres: artist.map(|a| a.genres.clone()).unwrap_or_default(),
        }
    }
}

pub fn detailed_track_info(props: &DetailedTrackProps) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<div class=\"track-detail\" data-track-id=\"{}\">",
        escape(&props.track_id)
    );
    let _ = writeln!(
        out,
        "  {}",
        cover(props.album_image.as_deref(), "track-detail__cover")
    );
    let _ = writeln!(out, "  <h2 class=\"track-detail__name\">{}</h2>", escape(&props.track_name));
    let _ = writeln!(
        out,
        "  <p class=\"track-detail__artist\">{}</p>",
        escape(&props.artist_name)
    );
    out.push_str("  <dl class=\"track-detail__facts\">\n");
    let _ = writeln!(out, "    <dt>Album</dt><dd>{}</dd>", escape(&props.album_name));
    let _ = writeln!(out, "    <dt>Duration</dt><dd>{}</dd>", escape(&props.duration));
    let _ = writeln!(out, "    <dt>Popularity</dt><dd>{}</dd>", props.popularity);
    if !props.release_date.is_empty() {
        let _ = writeln!(
            out,
            "    <dt>Released</dt><dd>{}</dd>",
            escape(&props.release_date)
        );
    }
    out.push_str("  </dl>\n");

    if !props.genres.is_empty() {
        out.push_str("  <ul class=\"track-detail__genres\">\n");
        for genre in &props.genres {
            let _ = writeln!(out, "    <li>{}</li>", escape(genre));
        }
        out.push_str("  </ul>\n");
    }

    out.push_str("  <button type=\"button\" data-on-click=\"$dialog_open = false\">Close</button>\n");
    out.push_str("</div>");
    out
}

/// Full page shell. Sections fill themselves in over RPC on load.
pub fn home_page(signals: &SpotigoSignals) -> String {
    let initial = serde_json::to_string(signals).unwrap_or_else(|_| "{}".to_string());

    let playing = rpc::post("get-playing-song").exclude("/^dialog_/");
    let selected = rpc::post("update-selected-song").include("/^selected_song$/");
    let top = rpc::post("get-top-songs").include("/^current_tab$/");
    let queue_selected = rpc::post("queue-track").include("/^(recent|recommended)_songs$/");
    let add_selected = rpc::post("add-to-playlist").include("/^(recent|recommended)_songs$/");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>spotigo</title>
  <link rel="stylesheet" href="/assets/css/app.css">
  <script type="module" src="{script}"></script>
</head>
<body data-signals="{initial}">
  <header class="header">
    <h1>spotigo</h1>
    <nav>
      <button type="button" data-on-click="$current_tab = &#39;playing&#39;">Playing</button>
      <button type="button" data-on-click="$current_tab = &#39;top&#39;; {top}">Top songs</button>
      <a href="/auth/logout">Log out</a>
    </nav>
  </header>
  <main data-show="$current_tab !== &#39;top&#39;" data-on-load="{playing}" data-on-interval__duration.10s="{playing}">
    <section>
      <h2>Now playing</h2>
      <div id="playing-song">{empty}</div>
    </section>
    <section data-effect="$selected_song &amp;&amp; {selected}">
      <h2>Selected</h2>
      <div id="selected-song"></div>
      <h2>Recommended</h2>
      <ul class="track-list" id="recommended-songs"></ul>
    </section>
    <section>
      <h2>Recently played</h2>
      <ul class="track-list" id="recent-songs"></ul>
      <button type="button" data-on-click="{queue_selected}">Queue selected</button>
      <button type="button" data-on-click="{add_selected}">Add selected to playlist</button>
    </section>
  </main>
  <section data-show="$current_tab === &#39;top&#39;">
    <h2>Top songs</h2>
    <div id="top-songs"></div>
  </section>
  <dialog data-attr-open="$dialog_open">
    <div id="dialog-content"></div>
  </dialog>
  <div id="toasts" class="toasts"></div>
</body>
</html>"#,
        script = DATASTAR_SCRIPT,
        initial = escape(&initial),
        top = escape(&top.build()),
        playing = escape(&playing.build()),
        empty = track_card_empty(),
        selected = escape(&selected.build()),
        queue_selected = escape(&queue_selected.build()),
        add_selected = escape(&add_selected.build()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotigo_spotify::{Album, Image, SimpleArtist};

    fn track() -> Track {
        Track {
            id: "t1".to_string(),
            name: "Song <One>".to_string(),
            duration_ms: 185_000,
            popularity: 71,
            artists: vec![SimpleArtist {
                id: "a1".to_string(),
                name: "Band & Co".to_string(),
            }],
            album: Some(Album {
                id: "al1".to_string(),
                name: "Album".to_string(),
                images: vec![Image {
                    url: "https://img/1.jpg".to_string(),
                    width: None,
                    height: None,
                }],
                release_date: "2020-01-02".to_string(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(185_000), "3:05");
        assert_eq!(format_duration(3_600_999), "60:00");
    }

    #[test]
    fn test_track_card_escapes_text() {
        let html = track_card(&track());
        assert!(html.contains("Song &lt;One&gt;"));
        assert!(html.contains("Band &amp; Co"));
        assert!(html.contains("https://img/1.jpg"));
        assert!(html.contains("/rpc/queue-track?track_id=t1"));
    }

    #[test]
    fn test_track_list_binds_signal() {
        let html = track_list(Some("recent-songs"), Some("recent_songs"), &[track()]);
        assert!(html.starts_with("<ul class=\"track-list\" id=\"recent-songs\">"));
        assert!(html.contains("data-bind=\"recent_songs\""));
        assert!(html.contains("value=\"t1\""));

        let empty = track_list(None, None, &[]);
        assert_eq!(empty, "<ul class=\"track-list\">\n</ul>");
    }

    #[test]
    fn test_track_list_quotes_id_inside_click_expression() {
        let mut quoted = track();
        quoted.id = "x');alert(1);('".to_string();

        let html = track_list(None, Some("recent_songs"), &[quoted]);
        assert!(html.contains(
            "data-on-click=\"$selected_song = &#39;x\\&#39;);alert(1);(\\&#39;&#39;\""
        ));
        assert!(html.contains("value=\"x&#39;);alert(1);(&#39;\""));
    }

    #[test]
    fn test_detailed_props() {
        let artist = Artist {
            id: "a1".to_string(),
            name: "Band & Co".to_string(),
            genres: vec!["indie".to_string()],
            images: Vec::new(),
        };
        let props = DetailedTrackProps::new(&track(), Some(&artist));
        assert_eq!(props.duration, "3:05");
        assert_eq!(props.artist_name, "Band & Co");
        assert_eq!(props.release_date, "2020-01-02");
        assert_eq!(props.genres, vec!["indie"]);

        let html = detailed_track_info(&props);
        assert!(html.contains("<li>indie</li>"));
        assert!(html.contains("<dd>71</dd>"));
    }

    #[test]
    fn test_detailed_props_without_artists() {
        let mut bare = track();
        bare.artists.clear();
        bare.album = None;
        let props = DetailedTrackProps::new(&bare, None);
        assert_eq!(props.artist_name, "");
        assert!(props.album_image.is_none());
        assert!(props.genres.is_empty());
    }

    #[test]
    fn test_home_page_has_patch_targets() {
        let html = home_page(&SpotigoSignals::default());
        for id in [
            "playing-song",
            "recent-songs",
            "selected-song",
            "recommended-songs",
            "top-songs",
            "dialog-content",
            "toasts",
        ] {
            assert!(html.contains(&format!("id=\"{id}\"")), "missing #{id}");
        }
        assert!(html.contains("&quot;selected_song&quot;:&quot;&quot;"));
    }
}
