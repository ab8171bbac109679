//! Editable-plugin overlays.
//!
//! An overlay is a floating rectangle drawn over a plugin (or a whole
//! placeholder) with a small control strip centred on its bottom edge:
//! move up / delete / move down for plugins, "add plugin" for placeholders.
//! Overlays are created by the host's plugin logic, measured from the
//! plugin's rendered elements and hidden again once the pointer leaves both
//! the rectangle and the control strip.
//!
//! All live overlays are tracked by an [`OverlayRegistry`] owned by the
//! preview context; switching between structure and content mode destroys
//! them all.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cms_preview_core::{
    compute_bounds, plugin_order, point_in_rect, swapped_order, BoundsOptions, Coordinates,
    ElementBox, ElementKey, GeometryError, MoveDirection, MoveRequest, PlaceholderId, Point,
    PluginDescriptor, PluginId, Size,
};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Padding around plugin overlays.
pub const PLUGIN_OVERLAY_PADDING: f64 = 1.0;

/// Padding around placeholder overlays.
pub const PLACEHOLDER_OVERLAY_PADDING: f64 = 0.0;

/// Error type for overlay operations.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("could not measure overlay target: {0}")]
    Measure(#[from] GeometryError),

    #[error("reorder request rejected: {0}")]
    Reorder(String),

    #[error("plugin {0} is not part of its placeholder order")]
    NotInOrder(PluginId),

    #[error("{0} is not available on this overlay")]
    Unsupported(&'static str),
}

/// What an overlay is drawn over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Plugin {
        plugin_id: PluginId,
        placeholder_id: PlaceholderId,
    },
    Placeholder {
        placeholder_id: PlaceholderId,
    },
}

/// A button in the overlay's control strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayControl {
    MoveUp,
    Delete,
    MoveDown,
    AddPlugin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub control: OverlayControl,
    pub disabled: bool,
}

impl ControlState {
    fn new(control: OverlayControl, disabled: bool) -> Self {
        Self { control, disabled }
    }
}

/// Plugin ids of a placeholder in document order, with this overlay's
/// position in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOrder {
    pub ids: Vec<PluginId>,
    pub index: Option<usize>,
}

/// The host document as seen from an overlay.
pub trait OverlaySurface: Send + Sync {
    /// Boxes of every element rendered for `element`.
    fn measure(&self, element: &ElementKey) -> Vec<ElementBox>;

    /// Top margin of a relatively positioned root element, 0 otherwise.
    fn ancestor_offset(&self) -> f64;

    fn viewport_width(&self) -> f64;

    /// Descriptor lists of every plugin element of `placeholder`, in
    /// document order.
    fn placeholder_plugins(&self, placeholder: PlaceholderId) -> Vec<Vec<PluginDescriptor>>;

    /// Attaches the overlay (creating it on first use) at `rect`.
    fn mount(&self, uid: Uuid, rect: Coordinates, controls: &[ControlState]);

    /// Repositions an already created overlay.
    fn place(&self, uid: Uuid, rect: Coordinates);

    fn set_controls(&self, uid: Uuid, controls: &[ControlState]);

    /// Rendered size of the overlay's control strip.
    fn controls_size(&self, uid: Uuid) -> Size;

    /// Detaches the overlay, keeping it for a later `mount`.
    fn detach(&self, uid: Uuid);

    /// Removes the overlay for good.
    fn remove(&self, uid: Uuid);
}

/// Server collaborator accepting plugin reorder requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PluginMover: Send + Sync {
    async fn move_plugin(&self, request: MoveRequest) -> Result<(), String>;
}

/// Host actions triggered from the control strip.
pub trait PluginActions: Send + Sync {
    fn delete_plugin(&self, plugin_id: PluginId);
    fn open_add_plugin_modal(&self, placeholder_id: PlaceholderId);
}

/// Collaborators shared by all overlays.
#[derive(Clone)]
pub struct OverlayPorts {
    pub surface: Arc<dyn OverlaySurface>,
    pub mover: Arc<dyn PluginMover>,
    pub actions: Arc<dyn PluginActions>,
}

/// One overlay.
pub struct Overlay {
    uid: Uuid,
    kind: OverlayKind,
    element: ElementKey,
    ports: OverlayPorts,
    target_language: String,
    coordinates: Option<Coordinates>,
    controls_size: Size,
    ancestor_offset: f64,
    order: Option<PluginOrder>,
    initialized: bool,
    created: bool,
    visible: bool,
}

impl Overlay {
    pub fn plugin(
        element: ElementKey,
        plugin_id: PluginId,
        placeholder_id: PlaceholderId,
        ports: OverlayPorts,
        target_language: impl Into<String>,
    ) -> Self {
        Self::new(
            OverlayKind::Plugin {
                plugin_id,
                placeholder_id,
            },
            element,
            ports,
            target_language.into(),
        )
    }

    pub fn placeholder(element: ElementKey, placeholder_id: PlaceholderId, ports: OverlayPorts) -> Self {
        Self::new(
            OverlayKind::Placeholder { placeholder_id },
            element,
            ports,
            String::new(),
        )
    }

    fn new(kind: OverlayKind, element: ElementKey, ports: OverlayPorts, target_language: String) -> Self {
        Self {
            uid: Uuid::new_v4(),
            kind,
            element,
            ports,
            target_language,
            coordinates: None,
            controls_size: Size::default(),
            ancestor_offset: 0.0,
            order: None,
            initialized: false,
            created: false,
            visible: false,
        }
    }

    pub fn uid(&self) -> Uuid {
        self.uid
    }

    pub fn kind(&self) -> OverlayKind {
        self.kind
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    /// The placeholder order, computed on first use.
    pub fn plugin_order(&mut self) -> Option<&PluginOrder> {
        let OverlayKind::Plugin {
            plugin_id,
            placeholder_id,
        } = self.kind
        else {
            return None;
        };
        if self.order.is_none() {
            let ids = plugin_order(&self.ports.surface.placeholder_plugins(placeholder_id));
            let index = ids.iter().position(|id| *id == plugin_id);
            debug!(%plugin_id, ?index, count = ids.len(), "plugin order computed");
            self.order = Some(PluginOrder { ids, index });
        }
        self.order.as_ref()
    }

    /// State of the control strip buttons.
    pub fn controls(&mut self) -> Vec<ControlState> {
        match self.kind {
            OverlayKind::Placeholder { .. } => {
                vec![ControlState::new(OverlayControl::AddPlugin, false)]
            }
            OverlayKind::Plugin { .. } => {
                let (first, last) = match self.plugin_order() {
                    Some(PluginOrder {
                        ids,
                        index: Some(i),
                    }) => (*i == 0, *i + 1 == ids.len()),
                    _ => (true, true),
                };
                vec![
                    ControlState::new(OverlayControl::MoveUp, first),
                    ControlState::new(OverlayControl::Delete, false),
                    ControlState::new(OverlayControl::MoveDown, last),
                ]
            }
        }
    }

    /// Re-measures the target and repositions the overlay.
    pub fn update_coordinates(&mut self) -> Result<Coordinates, OverlayError> {
        let surface = Arc::clone(&self.ports.surface);
        let (with_margins, padding) = match self.kind {
            OverlayKind::Plugin { .. } => (false, PLUGIN_OVERLAY_PADDING),
            OverlayKind::Placeholder { .. } => (true, PLACEHOLDER_OVERLAY_PADDING),
        };
        let bounds = compute_bounds(
            &surface.measure(&self.element),
            BoundsOptions {
                with_margins,
                ancestor_offset: surface.ancestor_offset(),
            },
        )?;
        let rect = bounds.inflate(padding, surface.viewport_width());
        self.coordinates = Some(rect);
        self.ancestor_offset = surface.ancestor_offset();

        if self.created {
            surface.place(self.uid, rect);
            if matches!(self.kind, OverlayKind::Placeholder { .. }) {
                self.controls_size = surface.controls_size(self.uid);
            }
        }
        Ok(rect)
    }

    /// Measures the target and attaches the overlay over it.
    pub fn show(&mut self) -> Result<(), OverlayError> {
        let rect = self.update_coordinates()?;
        self.initialized = true;

        let controls = self.controls();
        let surface = Arc::clone(&self.ports.surface);
        surface.mount(self.uid, rect, &controls);
        self.created = true;
        self.controls_size = surface.controls_size(self.uid);
        self.visible = true;
        debug!(uid = %self.uid, "overlay shown");
        Ok(())
    }

    pub fn hide(&mut self) {
        self.visible = false;
        if self.created {
            self.ports.surface.detach(self.uid);
        }
    }

    /// Whether `point` lies over the overlay rectangle or its control strip.
    pub fn is_in_bounds(&self, point: Point) -> bool {
        let Some(rect) = self.coordinates else {
            return false;
        };
        let offset = self.ancestor_offset;
        let controls = Coordinates {
            left: rect.left + rect.width / 2.0 - self.controls_size.width / 2.0,
            top: rect.top + rect.height + offset - self.controls_size.height / 2.0,
            width: self.controls_size.width,
            height: self.controls_size.height,
        };
        point_in_rect(point, &rect.shifted_down(offset)) || point_in_rect(point, &controls)
    }

    /// Hides a visible overlay once the pointer left it.  Returns whether it
    /// was hidden.
    pub fn pointer_moved(&mut self, point: Point) -> bool {
        if !self.visible || self.is_in_bounds(point) {
            return false;
        }
        self.hide();
        true
    }

    /// Swaps the plugin with its neighbour and asks the server to persist
    /// the new order.
    ///
    /// Returns `Ok(false)` when the move is disabled (first plugin moving up,
    /// last plugin moving down).  The local order only changes after the
    /// server accepted the request.
    pub async fn move_plugin(&mut self, direction: MoveDirection) -> Result<bool, OverlayError> {
        let OverlayKind::Plugin {
            plugin_id,
            placeholder_id,
        } = self.kind
        else {
            return Err(OverlayError::Unsupported("moving"));
        };
        let current = self
            .plugin_order()
            .cloned()
            .ok_or(OverlayError::Unsupported("moving"))?;
        let index = current.index.ok_or(OverlayError::NotInOrder(plugin_id))?;
        let Some((ids, new_index)) = swapped_order(&current.ids, index, direction) else {
            debug!(%plugin_id, ?direction, "move disabled at boundary");
            return Ok(false);
        };

        let request = MoveRequest {
            placeholder_id,
            plugin_id,
            plugin_parent: None,
            target_language: self.target_language.clone(),
            plugin_order: ids.clone(),
            move_a_copy: false,
        };
        self.ports
            .mover
            .move_plugin(request)
            .await
            .map_err(OverlayError::Reorder)?;

        info!(%plugin_id, ?direction, new_index, "plugin moved");
        self.order = Some(PluginOrder {
            ids,
            index: Some(new_index),
        });
        if self.created {
            let controls = self.controls();
            self.ports.surface.set_controls(self.uid, &controls);
            // The element moved in the document.
            if let Err(e) = self.update_coordinates() {
                warn!(uid = %self.uid, "overlay re-measure after move failed: {e}");
            }
        }
        Ok(true)
    }

    pub fn delete(&self) -> Result<(), OverlayError> {
        match self.kind {
            OverlayKind::Plugin { plugin_id, .. } => {
                self.ports.actions.delete_plugin(plugin_id);
                Ok(())
            }
            OverlayKind::Placeholder { .. } => Err(OverlayError::Unsupported("deleting")),
        }
    }

    pub fn add_plugin(&self) -> Result<(), OverlayError> {
        match self.kind {
            OverlayKind::Placeholder { placeholder_id } => {
                self.ports.actions.open_add_plugin_modal(placeholder_id);
                Ok(())
            }
            OverlayKind::Plugin { .. } => Err(OverlayError::Unsupported("adding plugins")),
        }
    }

    /// Removes the overlay from the page.
    pub fn destroy(self) {
        if self.created {
            self.ports.surface.remove(self.uid);
        }
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// All live overlays.
#[derive(Default)]
pub struct OverlayRegistry {
    overlays: Vec<Overlay>,
    pending_pointer: Option<Point>,
}

impl OverlayRegistry {
    pub fn register(&mut self, overlay: Overlay) -> Uuid {
        let uid = overlay.uid();
        self.overlays.push(overlay);
        uid
    }

    pub fn get(&self, uid: Uuid) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.uid == uid)
    }

    pub fn get_mut(&mut self, uid: Uuid) -> Option<&mut Overlay> {
        self.overlays.iter_mut().find(|o| o.uid == uid)
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn destroy(&mut self, uid: Uuid) -> bool {
        match self.overlays.iter().position(|o| o.uid == uid) {
            Some(i) => {
                self.overlays.remove(i).destroy();
                true
            }
            None => false,
        }
    }

    /// Destroys every overlay and empties the registry.
    pub fn destroy_all(&mut self) -> usize {
        let count = self.overlays.len();
        for overlay in self.overlays.drain(..) {
            overlay.destroy();
        }
        self.pending_pointer = None;
        if count > 0 {
            info!(count, "destroyed all overlays");
        }
        count
    }

    /// Re-measures every overlay that has been shown.
    pub fn window_resized(&mut self) {
        for overlay in self.overlays.iter_mut().filter(|o| o.initialized) {
            if let Err(e) = overlay.update_coordinates() {
                warn!(uid = %overlay.uid, "overlay re-measure failed: {e}");
            }
        }
    }

    /// Records a pointer position; only the latest one is evaluated by
    /// [`flush_pointer`](Self::flush_pointer).
    pub fn pointer_moved(&mut self, point: Point) {
        self.pending_pointer = Some(point);
    }

    /// Evaluates the pending pointer position against every visible overlay.
    /// Returns the overlays that were hidden.
    pub fn flush_pointer(&mut self) -> Vec<Uuid> {
        let Some(point) = self.pending_pointer.take() else {
            return Vec::new();
        };
        self.overlays
            .iter_mut()
            .filter_map(|o| o.pointer_moved(point).then_some(o.uid))
            .collect()
    }

    /// Waits out the debounce window, then flushes the pointer.
    pub async fn settle_pointer(&mut self, debounce: Duration) -> Vec<Uuid> {
        sleep(debounce).await;
        self.flush_pointer()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
