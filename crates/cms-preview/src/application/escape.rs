//! Nested-preview escape.
//!
//! The preview frame renders a clone of the host page, scripts included, so a
//! page loaded inside the frame could try to open a preview of its own.  A
//! document recognises it is running inside the preview by the frame's
//! sentinel window name.  If such a document was reached by navigating inside
//! the frame it sets the reactivation flag and navigates the top-level window
//! to its own URL instead; the next top-level load consumes the flag and opens
//! the preview again.
//!
//! The handshake assumes both documents share one origin and one copy of this
//! code, since it goes through the shared store and the top-level window.

use cms_preview_core::protocol::markers::{PREVIEW_WINDOW_NAME, REACTIVATE_STORAGE_KEY};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::application::context::KeyValueStore;

/// Value stored under the reactivation key.
pub const REACTIVATE_FLAG: i64 = 1;

/// URL reported by a document rendered from inline markup.
pub const SNAPSHOT_URL: &str = "about:srcdoc";

/// The browsing context a document was loaded into.
pub trait BrowsingContext: Send + Sync {
    fn window_name(&self) -> String;

    fn current_url(&self) -> String;

    /// Whether this is the top-level window.
    fn is_top_level(&self) -> bool;

    /// Navigates the top-level window to `url`.
    fn navigate_top(&self, url: &str);
}

/// What a freshly loaded document should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadDecision {
    /// Running inside the preview after in-frame navigation: the top-level
    /// window was sent to this URL.  Do nothing else.
    Escaped,
    /// A nested document escaped on the previous load; open the preview.
    Reactivate,
    /// Ordinary load.
    Normal,
}

/// Runs the escape handshake once per document load.
#[derive(Debug, Default)]
pub struct EscapeGuard {
    decided: Option<LoadDecision>,
}

impl EscapeGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides what this document should do.  Later calls return the first
    /// decision without touching the store or navigating again.
    pub fn on_document_load(
        &mut self,
        context: &dyn BrowsingContext,
        store: &dyn KeyValueStore,
    ) -> LoadDecision {
        if let Some(decision) = self.decided {
            return decision;
        }
        let decision = decide(context, store);
        self.decided = Some(decision);
        decision
    }
}

fn decide(context: &dyn BrowsingContext, store: &dyn KeyValueStore) -> LoadDecision {
    if context.window_name() == PREVIEW_WINDOW_NAME {
        if context.current_url() == SNAPSHOT_URL {
            debug!("snapshot rendered inside preview frame");
            return LoadDecision::Normal;
        }
        if let Err(e) = store.set(REACTIVATE_STORAGE_KEY, Value::from(REACTIVATE_FLAG)) {
            warn!("could not set reactivation flag: {e}");
        }
        let url = context.current_url();
        info!(%url, "navigation inside preview frame, escaping to top level");
        context.navigate_top(&url);
        return LoadDecision::Escaped;
    }

    if !context.is_top_level() {
        return LoadDecision::Normal;
    }

    match store.get(REACTIVATE_STORAGE_KEY) {
        Ok(Some(value)) if value.as_i64() == Some(REACTIVATE_FLAG) => {
            if let Err(e) = store.remove(REACTIVATE_STORAGE_KEY) {
                warn!("could not clear reactivation flag: {e}");
            }
            info!("reactivating responsive preview");
            LoadDecision::Reactivate
        }
        Ok(_) => LoadDecision::Normal,
        Err(e) => {
            warn!("reactivation flag unreadable: {e}");
            LoadDecision::Normal
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dom::mock::MockBrowsingContext;
    use crate::infrastructure::storage::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_navigation_inside_frame_escapes_once() {
        // Arrange
        let store = MemoryStore::new();
        let frame = MockBrowsingContext::new(PREVIEW_WINDOW_NAME, "https://cms.test/about/", false);
        let mut guard = EscapeGuard::new();

        // Act
        let first = guard.on_document_load(&frame, &store);
        let second = guard.on_document_load(&frame, &store);

        // Assert
        assert_eq!(first, LoadDecision::Escaped);
        assert_eq!(second, LoadDecision::Escaped);
        assert_eq!(frame.navigations(), vec!["https://cms.test/about/".to_string()]);
        assert_eq!(store.get(REACTIVATE_STORAGE_KEY).unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_initial_snapshot_render_does_not_escape() {
        let store = MemoryStore::new();
        let frame = MockBrowsingContext::new(PREVIEW_WINDOW_NAME, SNAPSHOT_URL, false);

        let decision = EscapeGuard::new().on_document_load(&frame, &store);

        assert_eq!(decision, LoadDecision::Normal);
        assert!(frame.navigations().is_empty());
        assert_eq!(store.get(REACTIVATE_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_top_level_load_consumes_flag_and_reactivates() {
        let store = MemoryStore::new();
        store.set(REACTIVATE_STORAGE_KEY, json!(1)).unwrap();
        let top = MockBrowsingContext::new("", "https://cms.test/about/", true);

        let decision = EscapeGuard::new().on_document_load(&top, &store);

        assert_eq!(decision, LoadDecision::Reactivate);
        assert_eq!(store.get(REACTIVATE_STORAGE_KEY).unwrap(), None);
        assert_eq!(
            EscapeGuard::new().on_document_load(&top, &store),
            LoadDecision::Normal
        );
    }

    #[test]
    fn test_other_iframes_leave_flag_alone() {
        let store = MemoryStore::new();
        store.set(REACTIVATE_STORAGE_KEY, json!(1)).unwrap();
        let modal = MockBrowsingContext::new("cms-modal", "https://cms.test/admin/", false);

        let decision = EscapeGuard::new().on_document_load(&modal, &store);

        assert_eq!(decision, LoadDecision::Normal);
        assert_eq!(store.get(REACTIVATE_STORAGE_KEY).unwrap(), Some(json!(1)));
    }
}
