//! Resizer: the device picker and simulated-viewport chrome.
//!
//! Owns the current device, persists every selection, sizes the wrapper that
//! holds the preview frame and keeps fixed-size frames at the exact device
//! width when the framed document grows a vertical scrollbar.
//!
//! # Scrollbar compensation
//!
//! After every fixed-size selection a single background task is spawned.  It
//! waits for the resize transition to finish, drops the transition marker and
//! then watches the frame: through [`FrameProbe::layout_changes`] when the
//! front-end can report layout changes, otherwise by probing every
//! `scrollbar_poll` interval.  The task handle is aborted before a new one is
//! started and when the resizer is destroyed or dropped, so at most one task
//! exists per resizer.

use std::sync::Arc;

use cms_preview_core::{Device, DeviceCatalog, FrameOffset, ScrollbarCompensation, Size};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::application::context::{load_device, persist_device, KeyValueStore, PreviewTimings};

/// Vertical offset applied to the preview box while an auto device is shown.
pub const AUTO_PREVIEW_MARGIN_TOP: f64 = -40.0;

/// A CSS length used for the wrapper, preview box and frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CssLength {
    Px(f64),
    Percent(f64),
}

impl CssLength {
    pub const FULL: CssLength = CssLength::Percent(100.0);
}

impl std::fmt::Display for CssLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CssLength::Px(v) => write!(f, "{v}px"),
            CssLength::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// Width and height of a sized box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSize {
    pub width: CssLength,
    pub height: CssLength,
}

impl BoxSize {
    pub const FULL: BoxSize = BoxSize {
        width: CssLength::FULL,
        height: CssLength::FULL,
    };

    pub fn px(width: u32, height: u32) -> Self {
        Self {
            width: CssLength::Px(f64::from(width)),
            height: CssLength::Px(f64::from(height)),
        }
    }

    /// Size of the box showing `device`.
    pub fn for_device(device: &Device) -> Self {
        match device.fixed_size() {
            Some((w, h)) => Self::px(w, h),
            None => Self::FULL,
        }
    }
}

/// The resizer chrome around the preview frame.
///
/// The front-end implements this against the host document; tests use
/// `infrastructure::dom::mock::MockResizerView`.
pub trait ResizerView: Send + Sync {
    /// Builds the picker with one button per device and moves the frame into
    /// the wrapper.
    fn build(&self, devices: &[Device]);

    /// Marks the picker button named `name` as the active one.
    fn set_active_device(&self, name: &str);

    fn set_info(&self, text: &str);

    /// Live size of the container holding the wrapper.
    fn container_size(&self) -> Size;

    /// Toggles the container's auto-size marker.
    fn set_container_auto(&self, auto: bool);

    fn set_wrapper_size(&self, size: BoxSize);

    /// Sizes the dashed preview box shown while hovering the picker.
    fn set_preview_box(&self, size: BoxSize, margin_top: f64);

    fn set_frame_width(&self, width: CssLength);

    /// Adds or removes the wrapper's transition marker.
    fn set_transition(&self, enabled: bool);

    /// Page offset of the wrapper's top-left corner in the host document.
    fn wrapper_offset(&self) -> FrameOffset;

    /// Removes the picker and wrapper from the host document.
    fn remove(&self);
}

/// Read-only probes into the framed document.
pub trait FrameProbe: Send + Sync {
    /// Width of the platform's vertical scrollbar; 0 on overlay-scrollbar
    /// platforms.
    fn native_scrollbar_width(&self) -> u32;

    fn has_vertical_scrollbar(&self) -> bool;

    /// Stream of layout-change notifications, when the front-end has one.
    /// `None` falls back to periodic probing.
    fn layout_changes(&self) -> Option<mpsc::UnboundedReceiver<()>>;
}

/// The device picker and viewport controller.
pub struct Resizer {
    view: Arc<dyn ResizerView>,
    probe: Arc<dyn FrameProbe>,
    store: Arc<dyn KeyValueStore>,
    catalog: DeviceCatalog,
    timings: PreviewTimings,
    current: Device,
    settle_task: Option<JoinHandle<()>>,
}

impl Resizer {
    /// Builds the chrome and applies the persisted device (or the catalog
    /// default).
    ///
    /// Must be called within a Tokio runtime for the transition and scrollbar
    /// tasks to run; without one the transition marker is dropped at once.
    pub fn new(
        view: Arc<dyn ResizerView>,
        probe: Arc<dyn FrameProbe>,
        store: Arc<dyn KeyValueStore>,
        catalog: DeviceCatalog,
        timings: PreviewTimings,
    ) -> Self {
        let devices: Vec<Device> = catalog.iter().cloned().collect();
        view.build(&devices);

        let current = load_device(store.as_ref(), &catalog);
        let mut resizer = Self {
            view,
            probe,
            store,
            catalog,
            timings,
            current: current.clone(),
            settle_task: None,
        };
        resizer.view.set_active_device(&current.name);
        resizer.change_device(current);
        resizer
    }

    pub fn current_device(&self) -> &Device {
        &self.current
    }

    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    pub fn wrapper_offset(&self) -> FrameOffset {
        self.view.wrapper_offset()
    }

    /// Handles a click on a picker button.
    ///
    /// Clicking the active auto device does nothing; clicking the active
    /// fixed device rotates it.  Any other device becomes the current one.
    pub fn click_device(&mut self, device: &Device) {
        if device.name == self.current.name {
            if device.is_auto() {
                debug!("active auto device clicked, nothing to do");
                return;
            }
            let rotated = self.current.rotated();
            self.change_device(rotated);
            return;
        }
        self.view.set_active_device(&device.name);
        self.change_device(device.clone());
    }

    /// Makes `device` current: persists it, resizes the wrapper and restarts
    /// the settle task.
    pub fn change_device(&mut self, device: Device) {
        info!(device = %device.name, width = %device.width, height = %device.height, "device changed");
        persist_device(self.store.as_ref(), &device);
        self.update_info(&device);
        self.cancel_settle_task();
        self.view.set_transition(true);

        let fixed = device.fixed_size();
        self.current = device;

        match fixed {
            None => {
                self.view.set_container_auto(true);
                self.view.set_wrapper_size(BoxSize::FULL);
                self.view.set_preview_box(BoxSize::FULL, AUTO_PREVIEW_MARGIN_TOP);
                self.view.set_frame_width(CssLength::FULL);
                self.spawn_settle_task(None);
            }
            Some((width, height)) => {
                self.view.set_container_auto(false);
                self.view.set_wrapper_size(BoxSize::px(width, height));
                self.view.set_preview_box(BoxSize::px(width, height), 0.0);
                self.view.set_frame_width(CssLength::FULL);
                self.spawn_settle_task(Some(width));
            }
        }
    }

    /// Previews `device` in the dashed box without selecting it.  Hovering
    /// the current device previews its rotation.
    pub fn hover_device(&self, device: &Device) {
        let shown = if *device == self.current {
            device.rotated()
        } else {
            device.clone()
        };
        self.show_preview_box(&shown);
    }

    /// Restores the preview box to the current device.
    pub fn leave_devices(&self) {
        self.show_preview_box(&self.current);
    }

    /// Refreshes the size readout after the host window resized.
    pub fn window_resized(&self) {
        self.update_info(&self.current);
    }

    /// Stops the settle task and removes the chrome.
    pub fn destroy(mut self) {
        self.cancel_settle_task();
        self.view.remove();
    }

    fn show_preview_box(&self, device: &Device) {
        if device.is_auto() {
            self.view.set_preview_box(BoxSize::FULL, AUTO_PREVIEW_MARGIN_TOP);
        } else {
            self.view.set_preview_box(BoxSize::for_device(device), 0.0);
        }
    }

    fn update_info(&self, device: &Device) {
        let text = match device.fixed_size() {
            Some((w, h)) => format_info(f64::from(w), f64::from(h)),
            None => {
                let size = self.view.container_size();
                format_info(size.width, size.height)
            }
        };
        self.view.set_info(&text);
    }

    fn cancel_settle_task(&mut self) {
        if let Some(task) = self.settle_task.take() {
            task.abort();
        }
    }

    fn spawn_settle_task(&mut self, fixed_width: Option<u32>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime, skipping transition and scrollbar tracking");
            self.view.set_transition(false);
            return;
        };
        let view = Arc::clone(&self.view);
        let probe = Arc::clone(&self.probe);
        let timings = self.timings;
        self.settle_task = Some(runtime.spawn(async move {
            sleep(timings.transition).await;
            view.set_transition(false);
            if let Some(width) = fixed_width {
                compensate_scrollbar(view, probe, width, timings).await;
            }
        }));
    }
}

impl Drop for Resizer {
    fn drop(&mut self) {
        self.cancel_settle_task();
    }
}

/// Keeps the frame `width` wide plus the scrollbar gutter while one shows.
async fn compensate_scrollbar(
    view: Arc<dyn ResizerView>,
    probe: Arc<dyn FrameProbe>,
    width: u32,
    timings: PreviewTimings,
) {
    let scrollbar = probe.native_scrollbar_width();
    if scrollbar == 0 {
        debug!("overlay scrollbars, no compensation needed");
        return;
    }

    let mut compensation = ScrollbarCompensation::new(width, scrollbar);
    let mut apply = |has_scrollbar: bool| {
        if let Some(frame_width) = compensation.observe(has_scrollbar) {
            debug!(frame_width, has_scrollbar, "adjusting frame width");
            view.set_frame_width(CssLength::Px(f64::from(frame_width)));
        }
    };

    match probe.layout_changes() {
        Some(mut changes) => {
            apply(probe.has_vertical_scrollbar());
            while changes.recv().await.is_some() {
                apply(probe.has_vertical_scrollbar());
            }
            debug!("layout notifications closed");
        }
        None => {
            let mut ticker = interval(timings.scrollbar_poll);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                apply(probe.has_vertical_scrollbar());
            }
        }
    }
}

/// Formats the `width⨉height` readout shown next to the picker.
pub fn format_info(width: f64, height: f64) -> String {
    format!("{}⨉{}", width.round() as i64, height.round() as i64)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dom::mock::{MockFrameProbe, MockResizerView};
    use crate::infrastructure::storage::store::MemoryStore;
    use cms_preview_core::protocol::markers::DEVICE_STORAGE_KEY;
    use serde_json::json;
    use std::time::Duration;

    fn build(
        store: Arc<MemoryStore>,
        probe: Arc<MockFrameProbe>,
    ) -> (Resizer, Arc<MockResizerView>) {
        let view = Arc::new(MockResizerView::new());
        let resizer = Resizer::new(
            view.clone(),
            probe,
            store,
            DeviceCatalog::default(),
            PreviewTimings::default(),
        );
        (resizer, view)
    }

    fn iphone5() -> Device {
        Device::fixed("iPhone 5", 320, 568)
    }

    // ── Selection ─────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_new_applies_catalog_default_when_nothing_stored() {
        // Arrange / Act
        let (resizer, view) = build(Arc::new(MemoryStore::new()), Arc::new(MockFrameProbe::new(0)));

        // Assert
        assert!(resizer.current_device().is_auto());
        assert_eq!(view.active_device().as_deref(), Some("Auto"));
        assert_eq!(view.built_devices().len(), 7);
        assert_eq!(view.wrapper_size(), Some(BoxSize::FULL));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_restores_persisted_device() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(DEVICE_STORAGE_KEY, json!({"name": "iPad", "width": 768, "height": 1024}))
            .unwrap();

        let (resizer, view) = build(store, Arc::new(MockFrameProbe::new(0)));

        assert_eq!(resizer.current_device().name, "iPad");
        assert_eq!(view.wrapper_size(), Some(BoxSize::px(768, 1024)));
        assert_eq!(view.info().as_deref(), Some("768⨉1024"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_fixed_device_persists_and_sizes_wrapper() {
        // Arrange
        let store = Arc::new(MemoryStore::new());
        let (mut resizer, view) = build(store.clone(), Arc::new(MockFrameProbe::new(0)));

        // Act
        resizer.click_device(&iphone5());

        // Assert
        assert_eq!(
            store.get(DEVICE_STORAGE_KEY).unwrap(),
            Some(json!({"name": "iPhone 5", "width": 320, "height": 568}))
        );
        assert_eq!(view.wrapper_size(), Some(BoxSize::px(320, 568)));
        assert_eq!(view.frame_width(), Some(CssLength::FULL));
        assert_eq!(view.container_auto(), Some(false));
        assert_eq!(view.active_device().as_deref(), Some("iPhone 5"));
        assert_eq!(view.info().as_deref(), Some("320⨉568"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_active_auto_device_is_noop() {
        let (mut resizer, view) = build(Arc::new(MemoryStore::new()), Arc::new(MockFrameProbe::new(0)));
        let calls_before = view.call_count();

        resizer.click_device(&Device::auto("Auto"));

        assert_eq!(view.call_count(), calls_before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_active_fixed_device_rotates_and_back() {
        let (mut resizer, view) = build(Arc::new(MemoryStore::new()), Arc::new(MockFrameProbe::new(0)));
        resizer.click_device(&iphone5());

        resizer.click_device(&iphone5());
        assert_eq!(resizer.current_device(), &Device::fixed("iPhone 5", 568, 320));
        assert_eq!(view.wrapper_size(), Some(BoxSize::px(568, 320)));

        resizer.click_device(&iphone5());
        assert_eq!(resizer.current_device(), &iphone5());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_device_info_reports_live_container_size() {
        let view = Arc::new(MockResizerView::new());
        view.set_container_size(Size {
            width: 1185.4,
            height: 702.0,
        });

        let resizer = Resizer::new(
            view.clone(),
            Arc::new(MockFrameProbe::new(0)),
            Arc::new(MemoryStore::new()),
            DeviceCatalog::default(),
            PreviewTimings::default(),
        );
        view.set_container_size(Size {
            width: 900.0,
            height: 600.0,
        });
        resizer.window_resized();

        assert_eq!(view.info().as_deref(), Some("900⨉600"));
    }

    // ── Hover preview ─────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_hover_other_device_previews_it_and_leave_restores() {
        let (mut resizer, view) = build(Arc::new(MemoryStore::new()), Arc::new(MockFrameProbe::new(0)));
        resizer.click_device(&iphone5());

        resizer.hover_device(&Device::fixed("iPad", 768, 1024));
        assert_eq!(view.preview_box(), Some((BoxSize::px(768, 1024), 0.0)));

        resizer.leave_devices();
        assert_eq!(view.preview_box(), Some((BoxSize::px(320, 568), 0.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hover_current_device_previews_rotation() {
        let (mut resizer, view) = build(Arc::new(MemoryStore::new()), Arc::new(MockFrameProbe::new(0)));
        resizer.click_device(&iphone5());

        resizer.hover_device(&iphone5());

        assert_eq!(view.preview_box(), Some((BoxSize::px(568, 320), 0.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hover_auto_device_uses_full_box_with_offset() {
        let (mut resizer, view) = build(Arc::new(MemoryStore::new()), Arc::new(MockFrameProbe::new(0)));
        resizer.click_device(&iphone5());

        resizer.hover_device(&Device::auto("Auto"));

        assert_eq!(
            view.preview_box(),
            Some((BoxSize::FULL, AUTO_PREVIEW_MARGIN_TOP))
        );
    }

    // ── Transition and scrollbar compensation ─────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_transition_marker_removed_after_transition_for_auto() {
        let (_resizer, view) = build(Arc::new(MemoryStore::new()), Arc::new(MockFrameProbe::new(0)));
        assert_eq!(view.transition(), Some(true));

        sleep(Duration::from_millis(151)).await;

        assert_eq!(view.transition(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_widens_frame_while_scrollbar_visible() {
        // Arrange
        let probe = Arc::new(MockFrameProbe::new(17));
        let (mut resizer, view) = build(Arc::new(MemoryStore::new()), probe.clone());
        resizer.click_device(&Device::fixed("iPhone 7", 375, 667));
        sleep(Duration::from_millis(160)).await;
        assert_eq!(view.frame_width(), Some(CssLength::FULL));

        // Act
        probe.set_has_scrollbar(true);
        sleep(Duration::from_millis(20)).await;

        // Assert
        assert_eq!(view.frame_width(), Some(CssLength::Px(392.0)));

        probe.set_has_scrollbar(false);
        sleep(Duration::from_millis(20)).await;
        assert_eq!(view.frame_width(), Some(CssLength::Px(375.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_compensation_on_overlay_scrollbar_platform() {
        let probe = Arc::new(MockFrameProbe::new(0));
        probe.set_has_scrollbar(true);
        let (mut resizer, view) = build(Arc::new(MemoryStore::new()), probe);

        resizer.click_device(&iphone5());
        sleep(Duration::from_millis(500)).await;

        assert_eq!(view.frame_width(), Some(CssLength::FULL));
        assert_eq!(view.transition(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_layout_notifications_drive_compensation() {
        let probe = Arc::new(MockFrameProbe::new(15).with_layout_notifications());
        let (mut resizer, view) = build(Arc::new(MemoryStore::new()), probe.clone());
        resizer.click_device(&iphone5());
        sleep(Duration::from_millis(160)).await;

        probe.set_has_scrollbar(true);
        probe.notify_layout_change();
        sleep(Duration::from_millis(1)).await;

        assert_eq!(view.frame_width(), Some(CssLength::Px(335.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_selection_cancels_previous_compensation() {
        let probe = Arc::new(MockFrameProbe::new(17));
        let (mut resizer, view) = build(Arc::new(MemoryStore::new()), probe.clone());
        resizer.click_device(&iphone5());
        sleep(Duration::from_millis(160)).await;

        resizer.click_device(&Device::auto("Auto"));
        probe.set_has_scrollbar(true);
        sleep(Duration::from_millis(500)).await;

        assert_eq!(view.frame_width(), Some(CssLength::FULL));
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_stops_polling_and_removes_chrome() {
        let probe = Arc::new(MockFrameProbe::new(17));
        let (mut resizer, view) = build(Arc::new(MemoryStore::new()), probe.clone());
        resizer.click_device(&iphone5());
        sleep(Duration::from_millis(160)).await;

        resizer.destroy();
        probe.set_has_scrollbar(true);
        sleep(Duration::from_millis(100)).await;

        assert!(view.removed());
        assert_eq!(view.frame_width(), Some(CssLength::FULL));
    }

    #[test]
    fn test_format_info_rounds_fractional_sizes() {
        assert_eq!(format_info(1185.4, 702.6), "1185⨉703");
    }

    #[test]
    fn test_css_length_display() {
        assert_eq!(CssLength::Px(320.0).to_string(), "320px");
        assert_eq!(CssLength::FULL.to_string(), "100%");
    }
}
