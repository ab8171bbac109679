//! Messages relayed from the preview frame to the host document, and the
//! plugin reorder request sent to the server collaborator.
//!
//! A relay event is a plain value `{type, target, pageX, pageY}` rather than a
//! mutated platform event, so the relay stays portable across front-ends.
//!
//! ```json
//! {"type":"pointerover","target":{"element":"plugin-42"},"pageX":320.0,"pageY":126.0}
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::geometry::Point;
use crate::domain::plugin::{ElementKey, PlaceholderId, PluginId};

// ── Event kinds ───────────────────────────────────────────────────────────────

/// Event types observed inside the frame and re-dispatched on the host under
/// the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    PointerOver,
    PointerOut,
    TouchStart,
    Click,
    DblClick,
    MouseMove,
    KeyDown,
    KeyUp,
}

impl EventKind {
    /// DOM event type name.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::PointerOver => "pointerover",
            EventKind::PointerOut => "pointerout",
            EventKind::TouchStart => "touchstart",
            EventKind::Click => "click",
            EventKind::DblClick => "dblclick",
            EventKind::MouseMove => "mousemove",
            EventKind::KeyDown => "keydown",
            EventKind::KeyUp => "keyup",
        }
    }

    /// Parses a DOM event type name.
    pub fn from_dom(name: &str) -> Option<Self> {
        Some(match name {
            "pointerover" => EventKind::PointerOver,
            "pointerout" => EventKind::PointerOut,
            "touchstart" => EventKind::TouchStart,
            "click" => EventKind::Click,
            "dblclick" => EventKind::DblClick,
            "mousemove" => EventKind::MouseMove,
            "keydown" => EventKind::KeyDown,
            "keyup" => EventKind::KeyUp,
            _ => return None,
        })
    }

    /// Event types intercepted on plugin elements (enter/leave/down/click/dblclick).
    pub fn is_plugin_pointer(self) -> bool {
        matches!(
            self,
            EventKind::PointerOver
                | EventKind::PointerOut
                | EventKind::TouchStart
                | EventKind::Click
                | EventKind::DblClick
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Relay events ──────────────────────────────────────────────────────────────

/// Where a relayed event is dispatched in the host document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayTarget {
    /// The host element carrying the same stable key.
    Element(ElementKey),
    /// The host `<body>`.
    Body,
}

/// A synthetic event re-dispatched on the host document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub target: RelayTarget,
    #[serde(rename = "pageX")]
    pub page_x: f64,
    #[serde(rename = "pageY")]
    pub page_y: f64,
}

impl RelayEvent {
    pub fn new(kind: EventKind, target: RelayTarget, at: Point) -> Self {
        Self {
            kind,
            target,
            page_x: at.page_x,
            page_y: at.page_y,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.page_x, self.page_y)
    }
}

// ── Reorder requests ──────────────────────────────────────────────────────────

/// Request body of a single-step plugin reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub placeholder_id: PlaceholderId,
    pub plugin_id: PluginId,
    /// Always empty for overlay moves: the plugin stays at the same level.
    pub plugin_parent: Option<PluginId>,
    pub target_language: String,
    /// Complete order of the placeholder after the move.
    pub plugin_order: Vec<PluginId>,
    pub move_a_copy: bool,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_dom_names_round_trip() {
        for kind in [
            EventKind::PointerOver,
            EventKind::PointerOut,
            EventKind::TouchStart,
            EventKind::Click,
            EventKind::DblClick,
            EventKind::MouseMove,
            EventKind::KeyDown,
            EventKind::KeyUp,
        ] {
            assert_eq!(EventKind::from_dom(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::from_dom("wheel"), None);
    }

    #[test]
    fn test_only_pointer_family_kinds_are_plugin_pointer_events() {
        assert!(EventKind::PointerOver.is_plugin_pointer());
        assert!(EventKind::DblClick.is_plugin_pointer());
        assert!(!EventKind::MouseMove.is_plugin_pointer());
        assert!(!EventKind::KeyDown.is_plugin_pointer());
    }

    #[test]
    fn test_relay_event_json_shape() {
        let event = RelayEvent::new(
            EventKind::PointerOver,
            RelayTarget::Element(ElementKey::new("plugin-42")),
            Point::new(320.0, 126.0),
        );

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "pointerover");
        assert_eq!(json["target"]["element"], "plugin-42");
        assert_eq!(json["pageX"], 320.0);
        assert_eq!(json["pageY"], 126.0);
    }

    #[test]
    fn test_body_target_serializes_as_string() {
        let json = serde_json::to_value(RelayTarget::Body).unwrap();
        assert_eq!(json, serde_json::json!("body"));
    }

    #[test]
    fn test_move_request_serializes_ids_as_numbers() {
        let req = MoveRequest {
            placeholder_id: PlaceholderId(3),
            plugin_id: PluginId(7),
            plugin_parent: None,
            target_language: "en".to_string(),
            plugin_order: vec![PluginId(7), PluginId(5)],
            move_a_copy: false,
        };

        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["plugin_order"], serde_json::json!([7, 5]));
        assert_eq!(json["plugin_parent"], serde_json::Value::Null);
        assert_eq!(json["move_a_copy"], false);
    }
}
