//! Datastar SSE event types.
//!
//! Two event kinds are produced:
//!
//! ```text
//! event: datastar-patch-elements
//! data: selector #playing-song
//! data: mode inner
//! data: elements <div>...</div>
//!
//! event: datastar-patch-signals
//! data: signals {"selected_song":"..."}
//! ```

use axum::response::sse::Event;

pub const EVENT_PATCH_ELEMENTS: &str = "datastar-patch-elements";
pub const EVENT_PATCH_SIGNALS: &str = "datastar-patch-signals";

/// How patched elements are applied to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatchMode {
    /// Morph the whole target element (Datastar default).
    #[default]
    Outer,
    /// Morph the target's children.
    Inner,
    /// Replace the target without morphing.
    Replace,
    Prepend,
    Append,
    Before,
    After,
    Remove,
}

impl PatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchMode::Outer => "outer",
            PatchMode::Inner => "inner",
            PatchMode::Replace => "replace",
            PatchMode::Prepend => "prepend",
            PatchMode::Append => "append",
            PatchMode::Before => "before",
            PatchMode::After => "after",
            PatchMode::Remove => "remove",
        }
    }
}

impl std::fmt::Display for PatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single server-pushed instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchEvent {
    /// Patch rendered HTML into the element(s) matching `selector`.
    Elements {
        selector: String,
        mode: PatchMode,
        elements: String,
    },
    /// JSON merge-patch applied to the client's signals.
    Signals { signals: String },
}

impl PatchEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            PatchEvent::Elements { .. } => EVENT_PATCH_ELEMENTS,
            PatchEvent::Signals { .. } => EVENT_PATCH_SIGNALS,
        }
    }

    /// `data:` line payloads, in order.
    pub fn data_lines(&self) -> Vec<String> {
        match self {
            PatchEvent::Elements {
                selector,
                mode,
                elements,
            } => {
                let mut lines = Vec::new();
                if !selector.is_empty() {
                    lines.push(format!("selector {selector}"));
                }
                if *mode != PatchMode::Outer {
                    lines.push(format!("mode {mode}"));
                }
                lines.extend(elements.lines().map(|line| format!("elements {line}")));
                lines
            }
            PatchEvent::Signals { signals } => signals
                .lines()
                .map(|line| format!("signals {line}"))
                .collect(),
        }
    }

    /// Convert to an axum SSE event.
    pub fn to_sse(&self) -> Event {
        Event::default()
            .event(self.event_type())
            .data(self.data_lines().join("\n"))
    }

    /// Raw wire text of this event, terminated by a blank line.
    pub fn encode(&self) -> String {
        let mut out = format!("event: {}\n", self.event_type());
        for line in self.data_lines() {
            out.push_str("data: ");
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
        out
    }

    pub fn selector(&self) -> Option<&str> {
        match self {
            PatchEvent::Elements { selector, .. } => Some(selector),
            PatchEvent::Signals { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_patch_wire_format() {
        let event = PatchEvent::Elements {
            selector: "#playing-song".to_string(),
            mode: PatchMode::Inner,
            elements: "<div>\n  <p>hi</p>\n</div>".to_string(),
        };
        assert_eq!(
            event.encode(),
            "event: datastar-patch-elements\n\
             data: selector #playing-song\n\
             data: mode inner\n\
             data: elements <div>\n\
             data: elements   <p>hi</p>\n\
             data: elements </div>\n\n"
        );
    }

    #[test]
    fn test_outer_mode_is_implicit() {
        let event = PatchEvent::Elements {
            selector: "#recent-songs".to_string(),
            mode: PatchMode::Outer,
            elements: "<ul id=\"recent-songs\"></ul>".to_string(),
        };
        let lines = event.data_lines();
        assert_eq!(lines.len(), 2);
        assert!(!lines.iter().any(|l| l.starts_with("mode")));
    }

    #[test]
    fn test_signals_wire_format() {
        let event = PatchEvent::Signals {
            signals: r#"{"dialog_open":true}"#.to_string(),
        };
        assert_eq!(
            event.encode(),
            "event: datastar-patch-signals\ndata: signals {\"dialog_open\":true}\n\n"
        );
    }
}
