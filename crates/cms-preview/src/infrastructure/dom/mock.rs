//! Recording in-memory adapters for every document port.
//!
//! Each mock keeps the latest state it was driven into (sizes, markers,
//! attached listeners) plus the calls that matter to assertions, so tests
//! can check outcomes without a browser.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cms_preview_core::domain::geometry::ancestor_offset;
use cms_preview_core::{
    Coordinates, Device, ElementBox, ElementKey, FrameOffset, MoveRequest, PlaceholderId,
    PluginDescriptor, PluginId, RelayEvent, Size,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::application::escape::BrowsingContext;
use crate::application::overlay::{
    ControlState, OverlayPorts, OverlaySurface, PluginActions, PluginMover,
};
use crate::application::preview::{PreviewFrameHost, PreviewPorts};
use crate::application::relay::{FrameInspector, HostBridge, TransientDomError};
use crate::application::resizer::{BoxSize, CssLength, FrameProbe, ResizerView};
use crate::application::snapshot::{
    DocumentParser, HostDocumentSource, LoadingIndicator, ParsedDocument, SnapshotError,
};

// ── Resizer ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ResizerViewState {
    built: Vec<Device>,
    active: Option<String>,
    info: Option<String>,
    container_auto: Option<bool>,
    wrapper: Option<BoxSize>,
    preview_box: Option<(BoxSize, f64)>,
    frame_width: Option<CssLength>,
    transition: Option<bool>,
    removed: bool,
    calls: usize,
}

/// Records what the resizer did to its chrome.
#[derive(Debug)]
pub struct MockResizerView {
    state: Mutex<ResizerViewState>,
    container: Mutex<Size>,
    offset: Mutex<FrameOffset>,
}

impl MockResizerView {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ResizerViewState::default()),
            container: Mutex::new(Size {
                width: 1280.0,
                height: 720.0,
            }),
            offset: Mutex::new(FrameOffset::default()),
        }
    }

    pub fn set_container_size(&self, size: Size) {
        *self.container.lock().expect("lock poisoned") = size;
    }

    pub fn set_wrapper_offset(&self, offset: FrameOffset) {
        *self.offset.lock().expect("lock poisoned") = offset;
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ResizerViewState) -> R) -> R {
        let mut state = self.state.lock().expect("lock poisoned");
        f(&mut state)
    }

    fn record(&self, f: impl FnOnce(&mut ResizerViewState)) {
        self.with_state(|s| {
            s.calls += 1;
            f(s);
        });
    }

    pub fn built_devices(&self) -> Vec<Device> {
        self.with_state(|s| s.built.clone())
    }
    pub fn active_device(&self) -> Option<String> {
        self.with_state(|s| s.active.clone())
    }
    pub fn info(&self) -> Option<String> {
        self.with_state(|s| s.info.clone())
    }
    pub fn container_auto(&self) -> Option<bool> {
        self.with_state(|s| s.container_auto)
    }
    pub fn wrapper_size(&self) -> Option<BoxSize> {
        self.with_state(|s| s.wrapper)
    }
    pub fn preview_box(&self) -> Option<(BoxSize, f64)> {
        self.with_state(|s| s.preview_box)
    }
    pub fn frame_width(&self) -> Option<CssLength> {
        self.with_state(|s| s.frame_width)
    }
    pub fn transition(&self) -> Option<bool> {
        self.with_state(|s| s.transition)
    }
    pub fn removed(&self) -> bool {
        self.with_state(|s| s.removed)
    }
    /// Number of mutating calls received.
    pub fn call_count(&self) -> usize {
        self.with_state(|s| s.calls)
    }
}

impl Default for MockResizerView {
    fn default() -> Self {
        Self::new()
    }
}

impl ResizerView for MockResizerView {
    fn build(&self, devices: &[Device]) {
        self.record(|s| {
            s.built = devices.to_vec();
            s.removed = false;
        });
    }

    fn set_active_device(&self, name: &str) {
        self.record(|s| s.active = Some(name.to_string()));
    }

    fn set_info(&self, text: &str) {
        self.record(|s| s.info = Some(text.to_string()));
    }

    fn container_size(&self) -> Size {
        *self.container.lock().expect("lock poisoned")
    }

    fn set_container_auto(&self, auto: bool) {
        self.record(|s| s.container_auto = Some(auto));
    }

    fn set_wrapper_size(&self, size: BoxSize) {
        self.record(|s| s.wrapper = Some(size));
    }

    fn set_preview_box(&self, size: BoxSize, margin_top: f64) {
        self.record(|s| s.preview_box = Some((size, margin_top)));
    }

    fn set_frame_width(&self, width: CssLength) {
        self.record(|s| s.frame_width = Some(width));
    }

    fn set_transition(&self, enabled: bool) {
        self.record(|s| s.transition = Some(enabled));
    }

    fn wrapper_offset(&self) -> FrameOffset {
        *self.offset.lock().expect("lock poisoned")
    }

    fn remove(&self) {
        self.record(|s| s.removed = true);
    }
}

/// Frame probe with a settable scrollbar state.
#[derive(Debug)]
pub struct MockFrameProbe {
    scrollbar_width: u32,
    has_scrollbar: AtomicBool,
    notifications: bool,
    layout_tx: Mutex<Option<mpsc::UnboundedSender<()>>>,
}

impl MockFrameProbe {
    /// A probe reporting `scrollbar_width` as the native scrollbar width and
    /// polled for changes.
    pub fn new(scrollbar_width: u32) -> Self {
        Self {
            scrollbar_width,
            has_scrollbar: AtomicBool::new(false),
            notifications: false,
            layout_tx: Mutex::new(None),
        }
    }

    /// Reports layout changes through a channel instead of being polled.
    pub fn with_layout_notifications(mut self) -> Self {
        self.notifications = true;
        self
    }

    pub fn set_has_scrollbar(&self, has: bool) {
        self.has_scrollbar.store(has, Ordering::SeqCst);
    }

    /// Sends one layout-change notification to the current listener.
    pub fn notify_layout_change(&self) {
        if let Some(tx) = self.layout_tx.lock().expect("lock poisoned").as_ref() {
            let _ = tx.send(());
        }
    }
}

impl FrameProbe for MockFrameProbe {
    fn native_scrollbar_width(&self) -> u32 {
        self.scrollbar_width
    }

    fn has_vertical_scrollbar(&self) -> bool {
        self.has_scrollbar.load(Ordering::SeqCst)
    }

    fn layout_changes(&self) -> Option<mpsc::UnboundedReceiver<()>> {
        if !self.notifications {
            return None;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.layout_tx.lock().expect("lock poisoned") = Some(tx);
        Some(rx)
    }
}

// ── Preview frame host ────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct FrameHostState {
    window_name: Option<String>,
    srcdocs: Vec<String>,
    page_scrolling: Option<bool>,
    trigger_active: bool,
    attached: Vec<String>,
}

/// Records frame creation, rendered markup and listener wiring.
#[derive(Debug, Default)]
pub struct MockFrameHost {
    state: Mutex<FrameHostState>,
}

impl MockFrameHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window_name(&self) -> Option<String> {
        self.state.lock().expect("lock poisoned").window_name.clone()
    }
    /// Every markup rendered into the frame, oldest first.
    pub fn srcdocs(&self) -> Vec<String> {
        self.state.lock().expect("lock poisoned").srcdocs.clone()
    }
    pub fn page_scrolling(&self) -> Option<bool> {
        self.state.lock().expect("lock poisoned").page_scrolling
    }
    pub fn trigger_active(&self) -> bool {
        self.state.lock().expect("lock poisoned").trigger_active
    }
    /// Listener namespaces currently attached.
    pub fn attached_namespaces(&self) -> Vec<String> {
        self.state.lock().expect("lock poisoned").attached.clone()
    }
}

impl PreviewFrameHost for MockFrameHost {
    fn frame_exists(&self) -> bool {
        self.state.lock().expect("lock poisoned").window_name.is_some()
    }

    fn ensure_frame(&self, window_name: &str) {
        let mut state = self.state.lock().expect("lock poisoned");
        if state.window_name.is_none() {
            state.window_name = Some(window_name.to_string());
        }
    }

    fn set_srcdoc(&self, markup: &str) {
        self.state
            .lock()
            .expect("lock poisoned")
            .srcdocs
            .push(markup.to_string());
    }

    fn set_page_scrolling(&self, enabled: bool) {
        self.state.lock().expect("lock poisoned").page_scrolling = Some(enabled);
    }

    fn set_trigger_active(&self, active: bool) {
        self.state.lock().expect("lock poisoned").trigger_active = active;
    }

    fn attach_listeners(&self, namespace: &str) {
        self.state
            .lock()
            .expect("lock poisoned")
            .attached
            .push(namespace.to_string());
    }

    fn detach_listeners(&self, namespace: &str) {
        self.state
            .lock()
            .expect("lock poisoned")
            .attached
            .retain(|n| n != namespace);
    }
}

// ── Relay ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct HostBridgeState {
    dispatched: Vec<RelayEvent>,
    expand: bool,
    structure: bool,
    highlighted: Vec<ElementKey>,
    highlight_clears: usize,
}

/// Host document that records relayed events.
#[derive(Debug)]
pub struct MockHostBridge {
    /// `None` accepts every key.
    keys: Option<HashSet<ElementKey>>,
    state: Mutex<HostBridgeState>,
}

impl MockHostBridge {
    /// A host whose document contains exactly `keys`.
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            keys: Some(keys.into_iter().map(ElementKey::new).collect()),
            state: Mutex::new(HostBridgeState::default()),
        }
    }

    /// A host that contains every key it is asked about.
    pub fn accepting_all() -> Self {
        Self {
            keys: None,
            state: Mutex::new(HostBridgeState::default()),
        }
    }

    pub fn dispatched(&self) -> Vec<RelayEvent> {
        self.state.lock().expect("lock poisoned").dispatched.clone()
    }
    pub fn clear_dispatched(&self) {
        self.state.lock().expect("lock poisoned").dispatched.clear();
    }
    pub fn set_structure_mode(&self, enabled: bool) {
        self.state.lock().expect("lock poisoned").structure = enabled;
    }
    pub fn highlighted(&self) -> Vec<ElementKey> {
        self.state.lock().expect("lock poisoned").highlighted.clone()
    }
    pub fn highlight_clears(&self) -> usize {
        self.state.lock().expect("lock poisoned").highlight_clears
    }
}

impl HostBridge for MockHostBridge {
    fn contains(&self, key: &ElementKey) -> bool {
        self.keys.as_ref().map_or(true, |keys| keys.contains(key))
    }

    fn dispatch(&self, event: RelayEvent) {
        self.state.lock().expect("lock poisoned").dispatched.push(event);
    }

    fn expand_mode(&self) -> bool {
        self.state.lock().expect("lock poisoned").expand
    }

    fn set_expand_mode(&self, enabled: bool) {
        self.state.lock().expect("lock poisoned").expand = enabled;
    }

    fn structure_mode(&self) -> bool {
        self.state.lock().expect("lock poisoned").structure
    }

    fn highlight_ancestor(&self, key: &ElementKey) {
        self.state
            .lock()
            .expect("lock poisoned")
            .highlighted
            .push(key.clone());
    }

    fn clear_ancestor_highlight(&self) {
        self.state.lock().expect("lock poisoned").highlight_clears += 1;
    }
}

/// Frame inspector returning a preset hover result.
#[derive(Debug)]
pub struct MockFrameInspector {
    hovered: Mutex<Result<Option<ElementKey>, String>>,
}

impl MockFrameInspector {
    pub fn new() -> Self {
        Self {
            hovered: Mutex::new(Ok(None)),
        }
    }

    pub fn set_hovered(&self, hovered: Result<Option<ElementKey>, TransientDomError>) {
        *self.hovered.lock().expect("lock poisoned") = hovered.map_err(|e| e.0);
    }
}

impl Default for MockFrameInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameInspector for MockFrameInspector {
    fn deepest_hovered_plugin(&self) -> Result<Option<ElementKey>, TransientDomError> {
        self.hovered
            .lock()
            .expect("lock poisoned")
            .clone()
            .map_err(TransientDomError)
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Host document source serving settable markup.
#[derive(Debug)]
pub struct MockDocumentSource {
    html: Mutex<String>,
    delay: Duration,
    fail_next: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl MockDocumentSource {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: Mutex::new(html.into()),
            delay: Duration::ZERO,
            fail_next: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Makes every read take `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_html(&self, html: impl Into<String>) {
        *self.html.lock().expect("lock poisoned") = html.into();
    }

    /// Makes the next read fail with `reason`.
    pub fn fail_next(&self, reason: impl Into<String>) {
        *self.fail_next.lock().expect("lock poisoned") = Some(reason.into());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostDocumentSource for MockDocumentSource {
    async fn outer_html(&self) -> Result<String, SnapshotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(reason) = self.fail_next.lock().expect("lock poisoned").take() {
            return Err(SnapshotError::SourceUnavailable(reason));
        }
        Ok(self.html.lock().expect("lock poisoned").clone())
    }
}

/// One mutation applied to a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOp {
    SetRootStyle(String, String),
    RemoveRootClasses(Vec<String>),
    RemoveMatching(String),
}

/// Parser whose documents record mutations and serialize unchanged.
#[derive(Debug, Default)]
pub struct MockDocumentParser {
    ops: Arc<Mutex<Vec<DocumentOp>>>,
}

impl MockDocumentParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<DocumentOp> {
        self.ops.lock().expect("lock poisoned").clone()
    }
}

impl DocumentParser for MockDocumentParser {
    fn parse(&self, markup: &str) -> Result<Box<dyn ParsedDocument>, SnapshotError> {
        Ok(Box::new(MockParsedDocument {
            markup: markup.to_string(),
            ops: Arc::clone(&self.ops),
        }))
    }
}

struct MockParsedDocument {
    markup: String,
    ops: Arc<Mutex<Vec<DocumentOp>>>,
}

impl MockParsedDocument {
    fn push(&self, op: DocumentOp) {
        self.ops.lock().expect("lock poisoned").push(op);
    }
}

impl ParsedDocument for MockParsedDocument {
    fn set_root_style(&mut self, property: &str, value: &str) {
        self.push(DocumentOp::SetRootStyle(property.to_string(), value.to_string()));
    }

    fn remove_root_classes(&mut self, classes: &[&str]) {
        self.push(DocumentOp::RemoveRootClasses(
            classes.iter().map(|c| c.to_string()).collect(),
        ));
    }

    fn remove_matching(&mut self, selector: &str) -> usize {
        self.push(DocumentOp::RemoveMatching(selector.to_string()));
        0
    }

    fn serialize(&self) -> String {
        self.markup.clone()
    }
}

/// Counts loader show/hide calls.
#[derive(Debug, Default)]
pub struct MockLoadingIndicator {
    shown: AtomicUsize,
    hidden: AtomicUsize,
}

impl MockLoadingIndicator {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn shown(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }
    pub fn hidden(&self) -> usize {
        self.hidden.load(Ordering::SeqCst)
    }
}

impl LoadingIndicator for MockLoadingIndicator {
    fn show_loader(&self) {
        self.shown.fetch_add(1, Ordering::SeqCst);
    }

    fn hide_loader(&self) {
        self.hidden.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Escape ────────────────────────────────────────────────────────────────────

/// Browsing context with a fixed name and URL that records navigations.
#[derive(Debug)]
pub struct MockBrowsingContext {
    name: String,
    url: String,
    top_level: bool,
    navigations: Mutex<Vec<String>>,
}

impl MockBrowsingContext {
    pub fn new(name: impl Into<String>, url: impl Into<String>, top_level: bool) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            top_level,
            navigations: Mutex::new(Vec::new()),
        }
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().expect("lock poisoned").clone()
    }
}

impl BrowsingContext for MockBrowsingContext {
    fn window_name(&self) -> String {
        self.name.clone()
    }

    fn current_url(&self) -> String {
        self.url.clone()
    }

    fn is_top_level(&self) -> bool {
        self.top_level
    }

    fn navigate_top(&self, url: &str) {
        self.navigations
            .lock()
            .expect("lock poisoned")
            .push(url.to_string());
    }
}

// ── Overlays ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SurfaceState {
    boxes: HashMap<ElementKey, Vec<ElementBox>>,
    placeholders: HashMap<PlaceholderId, Vec<Vec<PluginDescriptor>>>,
    ancestor_offset: f64,
    controls_size: Size,
    rects: HashMap<Uuid, Coordinates>,
    controls: HashMap<Uuid, Vec<ControlState>>,
    attached: HashSet<Uuid>,
    removed: Vec<Uuid>,
}

/// Host document with preset element boxes that records overlay placement.
#[derive(Debug)]
pub struct MockOverlaySurface {
    viewport_width: f64,
    state: Mutex<SurfaceState>,
}

impl MockOverlaySurface {
    pub fn new(viewport_width: f64) -> Self {
        Self {
            viewport_width,
            state: Mutex::new(SurfaceState::default()),
        }
    }

    pub fn set_boxes(&self, key: &str, boxes: Vec<ElementBox>) {
        self.state
            .lock()
            .expect("lock poisoned")
            .boxes
            .insert(ElementKey::new(key), boxes);
    }
    pub fn set_placeholder_plugins(&self, id: PlaceholderId, plugins: Vec<Vec<PluginDescriptor>>) {
        self.state
            .lock()
            .expect("lock poisoned")
            .placeholders
            .insert(id, plugins);
    }
    /// Root element layout: `position: relative` plus its `margin-top`.
    pub fn set_root_layout(&self, relative: bool, margin_top: &str) {
        self.state.lock().expect("lock poisoned").ancestor_offset =
            ancestor_offset(relative, margin_top);
    }
    pub fn set_controls_size(&self, size: Size) {
        self.state.lock().expect("lock poisoned").controls_size = size;
    }

    pub fn rect(&self, uid: Uuid) -> Option<Coordinates> {
        self.state.lock().expect("lock poisoned").rects.get(&uid).copied()
    }
    pub fn controls(&self, uid: Uuid) -> Option<Vec<ControlState>> {
        self.state
            .lock()
            .expect("lock poisoned")
            .controls
            .get(&uid)
            .cloned()
    }
    pub fn is_attached(&self, uid: Uuid) -> bool {
        self.state.lock().expect("lock poisoned").attached.contains(&uid)
    }
    pub fn removed(&self) -> Vec<Uuid> {
        self.state.lock().expect("lock poisoned").removed.clone()
    }
}

impl OverlaySurface for MockOverlaySurface {
    fn measure(&self, element: &ElementKey) -> Vec<ElementBox> {
        self.state
            .lock()
            .expect("lock poisoned")
            .boxes
            .get(element)
            .cloned()
            .unwrap_or_default()
    }

    fn ancestor_offset(&self) -> f64 {
        self.state.lock().expect("lock poisoned").ancestor_offset
    }

    fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    fn placeholder_plugins(&self, placeholder: PlaceholderId) -> Vec<Vec<PluginDescriptor>> {
        self.state
            .lock()
            .expect("lock poisoned")
            .placeholders
            .get(&placeholder)
            .cloned()
            .unwrap_or_default()
    }

    fn mount(&self, uid: Uuid, rect: Coordinates, controls: &[ControlState]) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.rects.insert(uid, rect);
        state.controls.insert(uid, controls.to_vec());
        state.attached.insert(uid);
    }

    fn place(&self, uid: Uuid, rect: Coordinates) {
        self.state.lock().expect("lock poisoned").rects.insert(uid, rect);
    }

    fn set_controls(&self, uid: Uuid, controls: &[ControlState]) {
        self.state
            .lock()
            .expect("lock poisoned")
            .controls
            .insert(uid, controls.to_vec());
    }

    fn controls_size(&self, _uid: Uuid) -> Size {
        self.state.lock().expect("lock poisoned").controls_size
    }

    fn detach(&self, uid: Uuid) {
        self.state.lock().expect("lock poisoned").attached.remove(&uid);
    }

    fn remove(&self, uid: Uuid) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.attached.remove(&uid);
        state.rects.remove(&uid);
        state.controls.remove(&uid);
        state.removed.push(uid);
    }
}

/// Records delete and add-plugin actions.
#[derive(Debug, Default)]
pub struct MockPluginActions {
    deleted: Mutex<Vec<PluginId>>,
    add_requests: Mutex<Vec<PlaceholderId>>,
}

impl MockPluginActions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn deleted(&self) -> Vec<PluginId> {
        self.deleted.lock().expect("lock poisoned").clone()
    }
    pub fn add_requests(&self) -> Vec<PlaceholderId> {
        self.add_requests.lock().expect("lock poisoned").clone()
    }
}

impl PluginActions for MockPluginActions {
    fn delete_plugin(&self, plugin_id: PluginId) {
        self.deleted.lock().expect("lock poisoned").push(plugin_id);
    }

    fn open_add_plugin_modal(&self, placeholder_id: PlaceholderId) {
        self.add_requests
            .lock()
            .expect("lock poisoned")
            .push(placeholder_id);
    }
}

/// Plugin mover that records requests and accepts or rejects all of them.
#[derive(Debug, Default)]
pub struct RecordingPluginMover {
    requests: Mutex<Vec<MoveRequest>>,
    rejection: Option<String>,
}

impl RecordingPluginMover {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mover rejecting every request with `reason`.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            rejection: Some(reason.into()),
        }
    }

    pub fn requests(&self) -> Vec<MoveRequest> {
        self.requests.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl PluginMover for RecordingPluginMover {
    async fn move_plugin(&self, request: MoveRequest) -> Result<(), String> {
        self.requests.lock().expect("lock poisoned").push(request);
        match &self.rejection {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }
}

// ── Whole document ────────────────────────────────────────────────────────────

/// Every mock adapter, wired together.
pub struct MockDom {
    pub frame_host: Arc<MockFrameHost>,
    pub resizer_view: Arc<MockResizerView>,
    pub probe: Arc<MockFrameProbe>,
    pub host: Arc<MockHostBridge>,
    pub inspector: Arc<MockFrameInspector>,
    pub source: Arc<MockDocumentSource>,
    pub parser: Arc<MockDocumentParser>,
    pub loader: Arc<MockLoadingIndicator>,
    pub surface: Arc<MockOverlaySurface>,
    pub mover: Arc<RecordingPluginMover>,
    pub actions: Arc<MockPluginActions>,
}

impl MockDom {
    /// A document serving `html`, with overlay scrollbars and a host that
    /// contains every element key.
    pub fn new(html: impl Into<String>) -> Self {
        Self::with_source(MockDocumentSource::new(html))
    }

    pub fn with_source(source: MockDocumentSource) -> Self {
        Self {
            frame_host: Arc::new(MockFrameHost::new()),
            resizer_view: Arc::new(MockResizerView::new()),
            probe: Arc::new(MockFrameProbe::new(0)),
            host: Arc::new(MockHostBridge::accepting_all()),
            inspector: Arc::new(MockFrameInspector::new()),
            source: Arc::new(source),
            parser: Arc::new(MockDocumentParser::new()),
            loader: Arc::new(MockLoadingIndicator::new()),
            surface: Arc::new(MockOverlaySurface::new(1280.0)),
            mover: Arc::new(RecordingPluginMover::new()),
            actions: Arc::new(MockPluginActions::new()),
        }
    }

    pub fn ports(&self) -> PreviewPorts {
        PreviewPorts {
            frame_host: self.frame_host.clone(),
            resizer_view: self.resizer_view.clone(),
            frame_probe: self.probe.clone(),
            host: self.host.clone(),
            inspector: self.inspector.clone(),
            source: self.source.clone(),
            parser: self.parser.clone(),
            loader: self.loader.clone(),
        }
    }

    pub fn overlay_ports(&self) -> OverlayPorts {
        OverlayPorts {
            surface: self.surface.clone(),
            mover: self.mover.clone(),
            actions: self.actions.clone(),
        }
    }
}
