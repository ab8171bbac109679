//! ResponsivePreview: the Closed/Open controller.
//!
//! Opening clones the host markup (memoized), renders it into the preview
//! frame, blocks host-page scrolling and builds the resizer.  Once the frame
//! has loaded and settled the relay listeners are wired so pointer events in
//! the frame drive the host's plugin UI.  Closing tears all of this down.
//!
//! ```text
//!            toggle / Reactivate
//!   Closed ─────────────────────────▶ Open
//!     ▲                                 │ frame_loaded ─▶ (settle) ─▶ relay armed
//!     └───────────── toggle ────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use cms_preview_core::protocol::markers::{FRAME_LISTENER_NAMESPACE, PREVIEW_WINDOW_NAME};
use cms_preview_core::Point;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::application::context::PreviewContext;
use crate::application::escape::LoadDecision;
use crate::application::relay::{EventRelay, FrameEvent, FrameInspector, HostBridge, RelayOutcome};
use crate::application::resizer::{FrameProbe, Resizer, ResizerView};
use crate::application::snapshot::{
    DocumentParser, HostDocumentSource, LoadingIndicator, MarkupSnapshot, SnapshotError,
};

/// Error type for the preview controller.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("snapshot failed: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("unknown device {0:?}")]
    UnknownDevice(String),

    #[error("preview is not open")]
    NotOpen,
}

/// The host page around the preview frame.
pub trait PreviewFrameHost: Send + Sync {
    fn frame_exists(&self) -> bool;

    /// Returns the preview frame, creating it with `window_name` if needed.
    fn ensure_frame(&self, window_name: &str);

    /// Replaces the frame's document with `markup`.
    fn set_srcdoc(&self, markup: &str);

    /// Allows or blocks scrolling of the host page.
    fn set_page_scrolling(&self, enabled: bool);

    /// Marks the toolbar trigger button as active.
    fn set_trigger_active(&self, active: bool);

    /// Wires the relay listeners on the frame document under `namespace`.
    fn attach_listeners(&self, namespace: &str);

    fn detach_listeners(&self, namespace: &str);
}

/// Every port the controller and its components need.
#[derive(Clone)]
pub struct PreviewPorts {
    pub frame_host: Arc<dyn PreviewFrameHost>,
    pub resizer_view: Arc<dyn ResizerView>,
    pub frame_probe: Arc<dyn FrameProbe>,
    pub host: Arc<dyn HostBridge>,
    pub inspector: Arc<dyn FrameInspector>,
    pub source: Arc<dyn HostDocumentSource>,
    pub parser: Arc<dyn DocumentParser>,
    pub loader: Arc<dyn LoadingIndicator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Closed,
    Open,
}

/// Issued by [`ResponsivePreview::frame_loaded`]; redeem it with
/// [`ResponsivePreview::frame_settled`] once `delay` has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleToken {
    generation: u64,
    pub delay: Duration,
}

/// The responsive preview controller.
pub struct ResponsivePreview {
    ctx: PreviewContext,
    ports: PreviewPorts,
    snapshot: MarkupSnapshot,
    relay: EventRelay,
    state: PreviewState,
    resizer: Option<Resizer>,
    relay_armed: bool,
    generation: u64,
}

impl ResponsivePreview {
    pub fn new(ctx: PreviewContext, ports: PreviewPorts) -> Self {
        let snapshot = MarkupSnapshot::new(
            Arc::clone(&ports.source),
            Arc::clone(&ports.parser),
            Arc::clone(&ports.loader),
        );
        let relay = EventRelay::new(
            Arc::clone(&ports.host),
            Arc::clone(&ports.inspector),
            ctx.settings.expand_key.clone(),
        );
        Self {
            ctx,
            ports,
            snapshot,
            relay,
            state: PreviewState::Closed,
            resizer: None,
            relay_armed: false,
            generation: 0,
        }
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == PreviewState::Open
    }

    pub fn is_relay_armed(&self) -> bool {
        self.relay_armed
    }

    pub fn context(&self) -> &PreviewContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut PreviewContext {
        &mut self.ctx
    }

    pub fn resizer(&self) -> Option<&Resizer> {
        self.resizer.as_ref()
    }

    pub fn snapshot(&self) -> &MarkupSnapshot {
        &self.snapshot
    }

    /// Opens a closed preview or closes an open one.
    pub async fn toggle(&mut self) -> Result<PreviewState, PreviewError> {
        match self.state {
            PreviewState::Open => self.close(),
            PreviewState::Closed => self.open().await?,
        }
        Ok(self.state)
    }

    /// Opens the preview.  Does nothing when already open.
    ///
    /// Nothing changes until the snapshot is ready, so dropping the returned
    /// future leaves the preview closed.
    pub async fn open(&mut self) -> Result<(), PreviewError> {
        if self.is_open() {
            return Ok(());
        }

        let markup = match self.snapshot.load().await {
            Ok(markup) => markup,
            Err(e) => {
                warn!("could not open responsive preview: {e}");
                return Err(e.into());
            }
        };

        self.state = PreviewState::Open;
        self.generation += 1;
        let host = &self.ports.frame_host;
        host.set_trigger_active(true);
        host.ensure_frame(PREVIEW_WINDOW_NAME);
        host.set_srcdoc(&markup);
        host.set_page_scrolling(false);
        self.resizer = Some(Resizer::new(
            Arc::clone(&self.ports.resizer_view),
            Arc::clone(&self.ports.frame_probe),
            Arc::clone(&self.ctx.store),
            self.ctx.catalog.clone(),
            self.ctx.timings,
        ));
        info!("responsive preview opened");
        Ok(())
    }

    /// Closes the preview.  Does nothing when already closed.
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        self.generation += 1;
        self.disarm_relay();
        if let Some(resizer) = self.resizer.take() {
            resizer.destroy();
        }
        self.ports.frame_host.set_page_scrolling(true);
        self.ports.frame_host.set_trigger_active(false);
        self.state = PreviewState::Closed;
        info!("responsive preview closed");
    }

    /// Called on the frame's load event.  Returns `None` when closed.
    pub fn frame_loaded(&mut self) -> Option<SettleToken> {
        if !self.is_open() {
            debug!("frame load while closed, ignored");
            return None;
        }
        self.disarm_relay();
        Some(SettleToken {
            generation: self.generation,
            delay: self.ctx.timings.settle_delay,
        })
    }

    /// Wires the relay listeners if nothing changed since `token` was issued.
    pub fn frame_settled(&mut self, token: SettleToken) -> bool {
        if !self.is_open() || token.generation != self.generation {
            debug!("stale frame settle, ignored");
            return false;
        }
        self.ports
            .frame_host
            .attach_listeners(FRAME_LISTENER_NAMESPACE);
        self.relay_armed = true;
        debug!("relay listeners attached");
        true
    }

    /// [`frame_loaded`](Self::frame_loaded), the settle delay and
    /// [`frame_settled`](Self::frame_settled) in one call.
    pub async fn settle_frame(&mut self) -> bool {
        let Some(token) = self.frame_loaded() else {
            return false;
        };
        sleep(token.delay).await;
        self.frame_settled(token)
    }

    /// The host content changed: drop the snapshot and re-render the frame
    /// if one exists.
    pub async fn content_refreshed(&mut self) -> Result<(), PreviewError> {
        self.snapshot.invalidate();
        if !self.ports.frame_host.frame_exists() {
            return Ok(());
        }
        let markup = self.snapshot.load().await?;
        self.generation += 1;
        self.disarm_relay();
        self.ports.frame_host.set_srcdoc(&markup);
        info!("preview frame refreshed");
        Ok(())
    }

    /// Relays one frame event.  Events arriving before the frame settled or
    /// after close are left untouched.
    pub fn handle_frame_event(&mut self, event: &FrameEvent) -> RelayOutcome {
        let Some(resizer) = self.resizer.as_ref().filter(|_| self.relay_armed) else {
            return RelayOutcome::default();
        };
        let offset = resizer.wrapper_offset();
        self.relay.handle(event, offset)
    }

    /// Host page coordinates to frame client coordinates, for host-initiated
    /// scrolling and hit testing.  `None` while closed.
    pub fn host_to_frame(&self, point: Point) -> Option<(f64, f64)> {
        self.resizer
            .as_ref()
            .map(|resizer| resizer.wrapper_offset().to_frame(point))
    }

    pub fn click_device(&mut self, name: &str) -> Result<(), PreviewError> {
        let device = self
            .ctx
            .catalog
            .get(name)
            .cloned()
            .ok_or_else(|| PreviewError::UnknownDevice(name.to_string()))?;
        let resizer = self.resizer.as_mut().ok_or(PreviewError::NotOpen)?;
        resizer.click_device(&device);
        Ok(())
    }

    pub fn hover_device(&self, name: &str) -> Result<(), PreviewError> {
        let device = self
            .ctx
            .catalog
            .get(name)
            .ok_or_else(|| PreviewError::UnknownDevice(name.to_string()))?;
        let resizer = self.resizer.as_ref().ok_or(PreviewError::NotOpen)?;
        resizer.hover_device(device);
        Ok(())
    }

    pub fn leave_devices(&self) {
        if let Some(resizer) = &self.resizer {
            resizer.leave_devices();
        }
    }

    pub fn window_resized(&mut self) {
        if let Some(resizer) = &self.resizer {
            resizer.window_resized();
        }
        self.ctx.overlays.window_resized();
    }

    /// Structure/content mode switch in the host.
    pub fn mode_switched(&mut self) -> usize {
        self.ctx.mode_switched()
    }

    /// Applies the document-load decision of the escape handshake.
    pub async fn on_ready(&mut self, decision: LoadDecision) -> Result<(), PreviewError> {
        match decision {
            LoadDecision::Reactivate => self.open().await,
            LoadDecision::Escaped | LoadDecision::Normal => Ok(()),
        }
    }

    fn disarm_relay(&mut self) {
        if self.relay_armed {
            self.ports
                .frame_host
                .detach_listeners(FRAME_LISTENER_NAMESPACE);
            self.relay_armed = false;
        }
        self.relay.reset();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
