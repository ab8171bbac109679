//! End-to-end tests of the responsive preview through the public API, with
//! the in-memory document adapters standing in for the browser.

use std::sync::Arc;
use std::time::Duration;

use cms_preview::application::context::{KeyValueStore, PreviewContext};
use cms_preview::application::escape::{EscapeGuard, LoadDecision};
use cms_preview::application::preview::{PreviewState, ResponsivePreview};
use cms_preview::application::relay::{FrameElement, FrameEvent};
use cms_preview::application::resizer::{BoxSize, CssLength};
use cms_preview::application::snapshot::MarkupSnapshot;
use cms_preview::infrastructure::dom::mock::{
    MockBrowsingContext, MockDocumentParser, MockDocumentSource, MockDom, MockLoadingIndicator,
};
use cms_preview::infrastructure::storage::store::MemoryStore;
use cms_preview_core::protocol::markers::{DEVICE_STORAGE_KEY, PREVIEW_WINDOW_NAME};
use cms_preview_core::{DeviceCatalog, ElementKey, EventKind, FrameOffset, RelayTarget};
use serde_json::json;

fn preview_with_store(dom: &MockDom, store: Arc<MemoryStore>) -> ResponsivePreview {
    let ctx = PreviewContext::new(store, DeviceCatalog::default());
    ResponsivePreview::new(ctx, dom.ports())
}

#[tokio::test(start_paused = true)]
async fn test_selecting_iphone5_then_auto() {
    // Arrange
    let dom = MockDom::new("<html><body>page</body></html>");
    let store = Arc::new(MemoryStore::new());
    let mut preview = preview_with_store(&dom, store.clone());
    preview.toggle().await.expect("open");

    // Act: pick a phone
    preview.click_device("iPhone 5").expect("known device");

    // Assert
    assert_eq!(
        store.get(DEVICE_STORAGE_KEY).unwrap(),
        Some(json!({"name": "iPhone 5", "width": 320, "height": 568}))
    );
    assert_eq!(dom.resizer_view.wrapper_size(), Some(BoxSize::px(320, 568)));

    // Act: back to auto
    preview.click_device("Auto").expect("known device");

    // Assert
    assert_eq!(dom.resizer_view.wrapper_size(), Some(BoxSize::FULL));
    assert_eq!(dom.resizer_view.frame_width(), Some(CssLength::FULL));
    assert_eq!(
        store.get(DEVICE_STORAGE_KEY).unwrap(),
        Some(json!({"name": "Auto", "width": "auto", "height": "auto"}))
    );
}

#[tokio::test(start_paused = true)]
async fn test_selected_device_survives_reopen() {
    let dom = MockDom::new("<html></html>");
    let store = Arc::new(MemoryStore::new());
    let mut preview = preview_with_store(&dom, store.clone());
    preview.open().await.unwrap();
    preview.click_device("iPad").unwrap();
    preview.click_device("iPad").unwrap();
    preview.close();

    let dom2 = MockDom::new("<html></html>");
    let mut reopened = preview_with_store(&dom2, store);
    reopened.open().await.unwrap();

    let current = reopened.resizer().unwrap().current_device().clone();
    assert_eq!(current.name, "iPad");
    assert_eq!(current.fixed_size(), Some((1024, 768)));
    assert_eq!(dom2.resizer_view.wrapper_size(), Some(BoxSize::px(1024, 768)));
}

#[tokio::test(start_paused = true)]
async fn test_frame_events_reach_host_at_host_coordinates() {
    // Arrange
    let dom = MockDom::new("<html></html>");
    dom.resizer_view.set_wrapper_offset(FrameOffset::new(412.0, 86.0));
    let mut preview = preview_with_store(&dom, Arc::new(MemoryStore::new()));
    preview.open().await.unwrap();
    preview.click_device("iPhone 5").unwrap();
    assert!(preview.settle_frame().await);

    // Act
    preview.handle_frame_event(&FrameEvent::pointer(
        EventKind::DblClick,
        FrameElement::plugin("plugin-42"),
        10.0,
        15.0,
    ));
    preview.handle_frame_event(&FrameEvent::mouse_move(None, 0.0, 0.0));

    // Assert
    let events = dom.host.dispatched();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, EventKind::DblClick);
    assert_eq!(events[0].target, RelayTarget::Element(ElementKey::new("plugin-42")));
    assert_eq!((events[0].page_x, events[0].page_y), (422.0, 101.0));
    assert_eq!(events[1].target, RelayTarget::Body);
    assert_eq!(
        preview.host_to_frame(events[0].point()),
        Some((10.0, 15.0))
    );
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_snapshot_requests_clone_once() {
    let source = Arc::new(
        MockDocumentSource::new("<html class=\"cms-ready\"></html>")
            .with_delay(Duration::from_millis(10)),
    );
    let snapshot = MarkupSnapshot::new(
        source.clone(),
        Arc::new(MockDocumentParser::new()),
        Arc::new(MockLoadingIndicator::new()),
    );

    let (first, second) = tokio::join!(snapshot.load(), snapshot.load());

    assert_eq!(source.calls(), 1);
    assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
}

#[tokio::test(start_paused = true)]
async fn test_in_frame_navigation_escapes_and_reopens_on_top_level() {
    // Arrange: a page loaded inside the preview frame by navigation.
    let store = Arc::new(MemoryStore::new());
    let frame = MockBrowsingContext::new(PREVIEW_WINDOW_NAME, "https://cms.test/news/", false);

    // Act: the nested document escapes.
    let nested = EscapeGuard::new().on_document_load(&frame, store.as_ref());

    // Assert
    assert_eq!(nested, LoadDecision::Escaped);
    assert_eq!(frame.navigations(), vec!["https://cms.test/news/".to_string()]);

    // Act: the top-level window loads the same URL.
    let top = MockBrowsingContext::new("", "https://cms.test/news/", true);
    let decision = EscapeGuard::new().on_document_load(&top, store.as_ref());
    let dom = MockDom::new("<html></html>");
    let mut preview = preview_with_store(&dom, store.clone());
    preview.on_ready(decision).await.unwrap();

    // Assert
    assert_eq!(decision, LoadDecision::Reactivate);
    assert_eq!(preview.state(), PreviewState::Open);
    assert_eq!(
        EscapeGuard::new().on_document_load(&top, store.as_ref()),
        LoadDecision::Normal
    );
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_relaying() {
    let dom = MockDom::new("<html></html>");
    let mut preview = preview_with_store(&dom, Arc::new(MemoryStore::new()));
    preview.open().await.unwrap();
    preview.settle_frame().await;
    preview.close();

    let outcome = preview.handle_frame_event(&FrameEvent::pointer(
        EventKind::Click,
        FrameElement::plugin("plugin-1"),
        1.0,
        1.0,
    ));

    assert!(!outcome.prevent_default);
    assert!(dom.host.dispatched().is_empty());
    assert_eq!(dom.frame_host.page_scrolling(), Some(true));
}
