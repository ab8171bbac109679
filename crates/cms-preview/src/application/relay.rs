//! EventRelay: re-targets frame events onto the host document.
//!
//! The host's plugin highlighting, double-click editing and drag handling are
//! bound to the host document.  While the preview is open the relay receives
//! every interesting event from the frame, decides how the frame itself should
//! treat it (default action, propagation) and dispatches a [`RelayEvent`] on
//! the matching host element at host page coordinates.
//!
//! Elements are matched across the two documents by their stable
//! [`ElementKey`], never by position or class names.

use std::sync::Arc;

use cms_preview_core::{ElementKey, EventKind, FrameOffset, RelayEvent, RelayTarget};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

/// A best-effort frame lookup failed (element gone, frame navigating).
///
/// These are expected while the frame reloads and are swallowed by the relay.
#[derive(Debug, Error)]
#[error("frame lookup failed: {0}")]
pub struct TransientDomError(pub String);

/// Pointer button of a click-like event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    #[default]
    Primary,
    Other,
}

/// The element an event was observed on inside the frame.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameElement {
    /// Stable key shared with the host element, when the element has one.
    #[serde(default)]
    pub key: Option<ElementKey>,
    /// The element is a plugin (or lies inside one).
    #[serde(default)]
    pub is_plugin: bool,
    /// The element is a render-model target whose primary click must reach
    /// the framed page.
    #[serde(default)]
    pub is_render_model: bool,
}

impl FrameElement {
    pub fn plugin(key: impl Into<String>) -> Self {
        Self {
            key: Some(ElementKey::new(key)),
            is_plugin: true,
            is_render_model: false,
        }
    }

    pub fn render_model(mut self) -> Self {
        self.is_render_model = true;
        self
    }
}

/// One event observed inside the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEvent {
    pub kind: EventKind,
    #[serde(default)]
    pub target: Option<FrameElement>,
    #[serde(default)]
    pub client_x: f64,
    #[serde(default)]
    pub client_y: f64,
    #[serde(default)]
    pub button: PointerButton,
    /// Key name for keyboard events.
    #[serde(default)]
    pub key: Option<String>,
}

impl FrameEvent {
    pub fn pointer(kind: EventKind, target: FrameElement, client_x: f64, client_y: f64) -> Self {
        Self {
            kind,
            target: Some(target),
            client_x,
            client_y,
            button: PointerButton::Primary,
            key: None,
        }
    }

    pub fn mouse_move(target: Option<FrameElement>, client_x: f64, client_y: f64) -> Self {
        Self {
            kind: EventKind::MouseMove,
            target,
            client_x,
            client_y,
            button: PointerButton::Primary,
            key: None,
        }
    }

    pub fn key(kind: EventKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            target: None,
            client_x: 0.0,
            client_y: 0.0,
            button: PointerButton::Primary,
            key: Some(key.into()),
        }
    }
}

/// What the frame should do with the original event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayOutcome {
    pub prevent_default: bool,
    pub stop_propagation: bool,
    /// Number of events dispatched on the host.
    pub dispatched: usize,
}

/// The host document as seen from the relay.
pub trait HostBridge: Send + Sync {
    /// Whether the host document has an element carrying `key`.
    fn contains(&self, key: &ElementKey) -> bool;

    fn dispatch(&self, event: RelayEvent);

    fn expand_mode(&self) -> bool;

    fn set_expand_mode(&self, enabled: bool);

    /// Whether the host is in structure-editing mode.
    fn structure_mode(&self) -> bool;

    fn highlight_ancestor(&self, key: &ElementKey);

    fn clear_ancestor_highlight(&self);
}

/// Best-effort queries into the frame document.
pub trait FrameInspector: Send + Sync {
    /// The innermost plugin element currently under the pointer.
    fn deepest_hovered_plugin(&self) -> Result<Option<ElementKey>, TransientDomError>;
}

/// Translates frame events into host relay events.
pub struct EventRelay {
    host: Arc<dyn HostBridge>,
    inspector: Arc<dyn FrameInspector>,
    expand_key: String,
    last_pointer: Option<(f64, f64)>,
}

impl EventRelay {
    pub fn new(
        host: Arc<dyn HostBridge>,
        inspector: Arc<dyn FrameInspector>,
        expand_key: impl Into<String>,
    ) -> Self {
        Self {
            host,
            inspector,
            expand_key: expand_key.into(),
            last_pointer: None,
        }
    }

    /// Forgets per-frame state (last pointer position).  Called when the
    /// frame is torn down or reloaded.
    pub fn reset(&mut self) {
        self.last_pointer = None;
    }

    /// Handles one frame event.  `offset` is the wrapper's current page
    /// offset in the host document.
    pub fn handle(&mut self, event: &FrameEvent, offset: FrameOffset) -> RelayOutcome {
        match event.kind {
            kind if kind.is_plugin_pointer() => self.handle_plugin_pointer(event, offset),
            EventKind::MouseMove => self.handle_mouse_move(event, offset),
            EventKind::KeyDown | EventKind::KeyUp => self.handle_key(event, offset),
            _ => RelayOutcome::default(),
        }
    }

    fn handle_plugin_pointer(&mut self, event: &FrameEvent, offset: FrameOffset) -> RelayOutcome {
        let Some(element) = event.target.as_ref().filter(|t| t.is_plugin) else {
            return RelayOutcome::default();
        };

        let primary_render_click = event.kind == EventKind::Click
            && event.button == PointerButton::Primary
            && element.is_render_model;
        let mut outcome = RelayOutcome {
            prevent_default: !primary_render_click,
            stop_propagation: event.kind != EventKind::Click,
            dispatched: 0,
        };

        if let Some(key) = &element.key {
            match event.kind {
                EventKind::PointerOver
                    if !element.is_render_model
                        && self.host.expand_mode()
                        && self.host.structure_mode() =>
                {
                    self.host.highlight_ancestor(key);
                }
                EventKind::PointerOut => self.host.clear_ancestor_highlight(),
                _ => {}
            }
        }

        self.last_pointer = Some((event.client_x, event.client_y));

        let Some(key) = element.key.clone() else {
            debug!(kind = %event.kind, "plugin element without key, not relayed");
            return outcome;
        };
        if !self.host.contains(&key) {
            debug!(kind = %event.kind, %key, "no host element for key");
            return outcome;
        }

        self.dispatch(
            event.kind,
            RelayTarget::Element(key),
            offset,
            event.client_x,
            event.client_y,
        );
        outcome.dispatched = 1;
        outcome
    }

    fn handle_mouse_move(&mut self, event: &FrameEvent, offset: FrameOffset) -> RelayOutcome {
        self.last_pointer = Some((event.client_x, event.client_y));
        let target = event
            .target
            .as_ref()
            .and_then(|t| t.key.clone())
            .filter(|key| self.host.contains(key))
            .map(RelayTarget::Element)
            .unwrap_or(RelayTarget::Body);
        self.dispatch(
            EventKind::MouseMove,
            target,
            offset,
            event.client_x,
            event.client_y,
        );
        RelayOutcome {
            dispatched: 1,
            ..RelayOutcome::default()
        }
    }

    fn handle_key(&mut self, event: &FrameEvent, offset: FrameOffset) -> RelayOutcome {
        if event.key.as_deref() != Some(self.expand_key.as_str()) {
            return RelayOutcome::default();
        }
        let enabled = event.kind == EventKind::KeyDown;
        if self.host.expand_mode() == enabled {
            trace!(enabled, "expand mode unchanged (key repeat)");
            return RelayOutcome::default();
        }
        self.host.set_expand_mode(enabled);
        debug!(enabled, "expand mode toggled from frame");

        RelayOutcome {
            dispatched: self.resynthesize_hover(enabled, offset),
            ..RelayOutcome::default()
        }
    }

    /// Re-announces the hovered plugin so the host re-evaluates its
    /// highlight under the new expand mode.
    fn resynthesize_hover(&self, expand: bool, offset: FrameOffset) -> usize {
        let hovered = match self.inspector.deepest_hovered_plugin() {
            Ok(Some(key)) => key,
            Ok(None) => return 0,
            Err(e) => {
                debug!("{e}");
                return 0;
            }
        };
        if !self.host.contains(&hovered) {
            return 0;
        }

        if expand && self.host.structure_mode() {
            self.host.highlight_ancestor(&hovered);
        } else {
            self.host.clear_ancestor_highlight();
        }

        let (x, y) = self.last_pointer.unwrap_or((0.0, 0.0));
        for kind in [EventKind::PointerOut, EventKind::PointerOver] {
            self.dispatch(kind, RelayTarget::Element(hovered.clone()), offset, x, y);
        }
        2
    }

    fn dispatch(
        &self,
        kind: EventKind,
        target: RelayTarget,
        offset: FrameOffset,
        client_x: f64,
        client_y: f64,
    ) {
        let event = RelayEvent::new(kind, target, offset.to_host(client_x, client_y));
        trace!(kind = %event.kind, x = event.page_x, y = event.page_y, "relaying");
        self.host.dispatch(event);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dom::mock::{MockFrameInspector, MockHostBridge};

    const OFFSET: FrameOffset = FrameOffset {
        left: 412.0,
        top: 86.0,
    };

    fn relay() -> (EventRelay, Arc<MockHostBridge>, Arc<MockFrameInspector>) {
        let host = Arc::new(MockHostBridge::new(["plugin-1", "plugin-2"]));
        let inspector = Arc::new(MockFrameInspector::new());
        let relay = EventRelay::new(host.clone(), inspector.clone(), "Shift");
        (relay, host, inspector)
    }

    // ── Plugin pointer events ─────────────────────────────────────────────────

    #[test]
    fn test_pointer_over_plugin_is_relayed_with_host_coordinates() {
        // Arrange
        let (mut relay, host, _) = relay();
        let event = FrameEvent::pointer(
            EventKind::PointerOver,
            FrameElement::plugin("plugin-1"),
            10.0,
            15.0,
        );

        // Act
        let outcome = relay.handle(&event, OFFSET);

        // Assert
        assert_eq!(
            host.dispatched(),
            vec![RelayEvent {
                kind: EventKind::PointerOver,
                target: RelayTarget::Element(ElementKey::new("plugin-1")),
                page_x: 422.0,
                page_y: 101.0,
            }]
        );
        assert!(outcome.prevent_default);
        assert!(outcome.stop_propagation);
    }

    #[test]
    fn test_click_on_plugin_is_prevented_but_propagates() {
        let (mut relay, _, _) = relay();
        let event = FrameEvent::pointer(EventKind::Click, FrameElement::plugin("plugin-1"), 1.0, 1.0);

        let outcome = relay.handle(&event, OFFSET);

        assert!(outcome.prevent_default);
        assert!(!outcome.stop_propagation);
        assert_eq!(outcome.dispatched, 1);
    }

    #[test]
    fn test_primary_click_on_render_model_keeps_default_action() {
        let (mut relay, host, _) = relay();
        let event = FrameEvent::pointer(
            EventKind::Click,
            FrameElement::plugin("plugin-2").render_model(),
            1.0,
            1.0,
        );

        let outcome = relay.handle(&event, OFFSET);

        assert!(!outcome.prevent_default);
        assert_eq!(host.dispatched().len(), 1);
    }

    #[test]
    fn test_secondary_click_on_render_model_is_prevented() {
        let (mut relay, _, _) = relay();
        let mut event = FrameEvent::pointer(
            EventKind::Click,
            FrameElement::plugin("plugin-2").render_model(),
            1.0,
            1.0,
        );
        event.button = PointerButton::Other;

        assert!(relay.handle(&event, OFFSET).prevent_default);
    }

    #[test]
    fn test_non_plugin_target_is_ignored() {
        let (mut relay, host, _) = relay();
        let event = FrameEvent::pointer(EventKind::Click, FrameElement::default(), 1.0, 1.0);

        let outcome = relay.handle(&event, OFFSET);

        assert_eq!(outcome, RelayOutcome::default());
        assert!(host.dispatched().is_empty());
    }

    #[test]
    fn test_unknown_host_key_is_not_dispatched() {
        let (mut relay, host, _) = relay();
        let event = FrameEvent::pointer(
            EventKind::DblClick,
            FrameElement::plugin("plugin-99"),
            1.0,
            1.0,
        );

        let outcome = relay.handle(&event, OFFSET);

        assert!(outcome.prevent_default);
        assert_eq!(outcome.dispatched, 0);
        assert!(host.dispatched().is_empty());
    }

    // ── Mouse move ────────────────────────────────────────────────────────────

    #[test]
    fn test_mouse_move_outside_plugins_targets_host_body() {
        let (mut relay, host, _) = relay();

        let outcome = relay.handle(&FrameEvent::mouse_move(None, 5.0, 6.0), OFFSET);

        assert!(!outcome.prevent_default);
        assert_eq!(host.dispatched()[0].target, RelayTarget::Body);
        assert_eq!(host.dispatched()[0].point().page_x, 417.0);
    }

    #[test]
    fn test_mouse_move_over_keyed_element_targets_it() {
        let (mut relay, host, _) = relay();

        relay.handle(
            &FrameEvent::mouse_move(Some(FrameElement::plugin("plugin-2")), 5.0, 6.0),
            OFFSET,
        );

        assert_eq!(
            host.dispatched()[0].target,
            RelayTarget::Element(ElementKey::new("plugin-2"))
        );
    }

    // ── Expand mode ───────────────────────────────────────────────────────────

    #[test]
    fn test_expand_key_toggles_mode_and_resynthesizes_hover() {
        // Arrange
        let (mut relay, host, inspector) = relay();
        host.set_structure_mode(true);
        inspector.set_hovered(Ok(Some(ElementKey::new("plugin-1"))));
        relay.handle(&FrameEvent::mouse_move(None, 20.0, 30.0), OFFSET);
        host.clear_dispatched();

        // Act
        let outcome = relay.handle(&FrameEvent::key(EventKind::KeyDown, "Shift"), OFFSET);

        // Assert
        assert!(host.expand_mode());
        assert_eq!(outcome.dispatched, 2);
        let kinds: Vec<EventKind> = host.dispatched().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::PointerOut, EventKind::PointerOver]);
        assert_eq!(host.dispatched()[1].page_y, 116.0);
        assert_eq!(host.highlighted(), vec![ElementKey::new("plugin-1")]);

        relay.handle(&FrameEvent::key(EventKind::KeyUp, "Shift"), OFFSET);
        assert!(!host.expand_mode());
        assert_eq!(host.highlight_clears(), 1);
    }

    #[test]
    fn test_key_repeat_does_not_resynthesize() {
        let (mut relay, host, inspector) = relay();
        inspector.set_hovered(Ok(Some(ElementKey::new("plugin-1"))));
        relay.handle(&FrameEvent::key(EventKind::KeyDown, "Shift"), OFFSET);
        host.clear_dispatched();

        let outcome = relay.handle(&FrameEvent::key(EventKind::KeyDown, "Shift"), OFFSET);

        assert_eq!(outcome.dispatched, 0);
        assert!(host.dispatched().is_empty());
    }

    #[test]
    fn test_other_keys_are_ignored() {
        let (mut relay, host, _) = relay();

        relay.handle(&FrameEvent::key(EventKind::KeyDown, "Alt"), OFFSET);

        assert!(!host.expand_mode());
    }

    #[test]
    fn test_hover_lookup_failure_is_swallowed() {
        let (mut relay, host, inspector) = relay();
        inspector.set_hovered(Err(TransientDomError("frame navigating".into())));

        let outcome = relay.handle(&FrameEvent::key(EventKind::KeyDown, "Shift"), OFFSET);

        assert!(host.expand_mode());
        assert_eq!(outcome.dispatched, 0);
    }

    #[test]
    fn test_hovering_plugin_in_expand_structure_mode_highlights_ancestor() {
        let (mut relay, host, _) = relay();
        host.set_structure_mode(true);
        host.set_expand_mode(true);

        relay.handle(
            &FrameEvent::pointer(EventKind::PointerOver, FrameElement::plugin("plugin-2"), 0.0, 0.0),
            OFFSET,
        );
        relay.handle(
            &FrameEvent::pointer(EventKind::PointerOut, FrameElement::plugin("plugin-2"), 0.0, 0.0),
            OFFSET,
        );

        assert_eq!(host.highlighted(), vec![ElementKey::new("plugin-2")]);
        assert_eq!(host.highlight_clears(), 1);
    }

    #[test]
    fn test_frame_event_deserializes_from_trace_json() {
        let json = r#"{"kind":"pointerover","target":{"key":"plugin-1","is_plugin":true},"client_x":3,"client_y":4}"#;

        let event: FrameEvent = serde_json::from_str(json).unwrap();

        assert_eq!(
            event,
            FrameEvent::pointer(EventKind::PointerOver, FrameElement::plugin("plugin-1"), 3.0, 4.0)
        );
    }
}
