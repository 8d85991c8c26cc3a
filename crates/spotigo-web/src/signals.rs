//! Signals records shared with the browser.
//!
//! Field names are the wire contract with the page's `data-*` bindings.

use serde::{Deserialize, Serialize};

/// Page-wide signals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotigoSignals {
    pub current_tab: String,
    /// Checked rows of the recommended list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_songs: Option<Vec<String>>,
    /// Checked rows of the recently played list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_songs: Option<Vec<String>>,
    pub selected_song: String,
    pub dialog_type: String,
    pub dialog_item_id: String,
    pub dialog_open: bool,
}

impl SpotigoSignals {
    /// Checked track ids, recommended list first.
    pub fn selected_ids(&self) -> Vec<String> {
        first_selection(&self.recommended_songs, &self.recent_songs)
    }
}

/// Signals sent by the queue buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueTrackSignals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_songs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_songs: Option<Vec<String>>,
}

impl QueueTrackSignals {
    /// Recommended selection if non-empty, else the recent selection.
    pub fn selected_ids(&self) -> Vec<String> {
        first_selection(&self.recommended_songs, &self.recent_songs)
    }
}

fn first_selection(primary: &Option<Vec<String>>, fallback: &Option<Vec<String>>) -> Vec<String> {
    [primary, fallback]
        .into_iter()
        .flatten()
        .map(|ids| {
            ids.iter()
                .filter(|id| !id.is_empty())
                .cloned()
                .collect::<Vec<_>>()
        })
        .find(|ids| !ids.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_lists_are_not_serialized() {
        let signals = SpotigoSignals {
            selected_song: "abc".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&signals).unwrap();
        assert!(!json.contains("recent_songs"));
        assert!(!json.contains("recommended_songs"));
        assert!(json.contains(r#""selected_song":"abc""#));
    }

    #[test]
    fn test_queue_selection_prefers_recommended() {
        let signals = QueueTrackSignals {
            recent_songs: Some(vec!["r".to_string()]),
            recommended_songs: Some(vec!["a".to_string(), "b".to_string()]),
        };
        assert_eq!(signals.selected_ids(), vec!["a", "b"]);

        let signals = QueueTrackSignals {
            recent_songs: Some(vec!["r".to_string()]),
            recommended_songs: Some(Vec::new()),
        };
        assert_eq!(signals.selected_ids(), vec!["r"]);

        assert!(QueueTrackSignals::default().selected_ids().is_empty());
    }
}
