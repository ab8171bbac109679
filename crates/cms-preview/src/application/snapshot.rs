//! Memoized snapshot of the host document markup.
//!
//! The preview frame renders a clone of the page being edited with all
//! editor chrome stripped.  Cloning is expensive, so the result is computed at
//! most once per content version: concurrent callers share one in-flight
//! computation and later callers get the settled value.  The memo is reset
//! when the host reports a content refresh, and after a failure so the next
//! open tries again.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use cms_preview_core::protocol::markers::{CHROME_SELECTORS, SNAPSHOT_STRIPPED_ROOT_CLASSES};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error type for snapshot computation.  Cloneable because one result is
/// handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("host document unavailable: {0}")]
    SourceUnavailable(String),

    #[error("could not parse host markup: {0}")]
    Parse(String),
}

/// Gives access to the live host document.
#[async_trait]
pub trait HostDocumentSource: Send + Sync {
    /// Serialized markup of the whole host document.
    async fn outer_html(&self) -> Result<String, SnapshotError>;
}

/// A detached, mutable copy of a document.
pub trait ParsedDocument: Send {
    fn set_root_style(&mut self, property: &str, value: &str);

    fn remove_root_classes(&mut self, classes: &[&str]);

    /// Removes every element matching `selector`; returns how many were
    /// removed.
    fn remove_matching(&mut self, selector: &str) -> usize;

    fn serialize(&self) -> String;
}

/// Parses markup into a [`ParsedDocument`].
pub trait DocumentParser: Send + Sync {
    fn parse(&self, markup: &str) -> Result<Box<dyn ParsedDocument>, SnapshotError>;
}

/// The host toolbar's loading indicator.
pub trait LoadingIndicator: Send + Sync {
    fn show_loader(&self);
    fn hide_loader(&self);
}

/// A snapshot result shared between all waiters.
pub type SharedMarkup = Shared<BoxFuture<'static, Result<Arc<str>, SnapshotError>>>;

#[derive(Default)]
struct MemoSlot {
    generation: u64,
    markup: Option<SharedMarkup>,
}

/// Memoized producer of the cleaned host markup.
pub struct MarkupSnapshot {
    source: Arc<dyn HostDocumentSource>,
    parser: Arc<dyn DocumentParser>,
    loader: Arc<dyn LoadingIndicator>,
    slot: Arc<Mutex<MemoSlot>>,
}

impl MarkupSnapshot {
    pub fn new(
        source: Arc<dyn HostDocumentSource>,
        parser: Arc<dyn DocumentParser>,
        loader: Arc<dyn LoadingIndicator>,
    ) -> Self {
        Self {
            source,
            parser,
            loader,
            slot: Arc::new(Mutex::new(MemoSlot::default())),
        }
    }

    /// Returns the shared snapshot future, starting the computation if no
    /// snapshot is memoized.
    pub fn load(&self) -> SharedMarkup {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(markup) = &slot.markup {
            return markup.clone();
        }

        let generation = slot.generation;
        let source = Arc::clone(&self.source);
        let parser = Arc::clone(&self.parser);
        let loader = Arc::clone(&self.loader);
        let memo = Arc::clone(&self.slot);

        loader.show_loader();
        let markup = async move {
            let result = clone_host_markup(source.as_ref(), parser.as_ref()).await;
            loader.hide_loader();
            if let Err(e) = &result {
                warn!("snapshot failed: {e}");
                let mut slot = memo.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.generation == generation {
                    slot.markup = None;
                }
            }
            result
        }
        .boxed()
        .shared();

        slot.markup = Some(markup.clone());
        markup
    }

    /// Drops the memoized snapshot; the next [`load`](Self::load) recomputes.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.generation = slot.generation.wrapping_add(1);
        slot.markup = None;
        debug!(generation = slot.generation, "snapshot invalidated");
    }

    pub fn is_memoized(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .markup
            .is_some()
    }
}

async fn clone_host_markup(
    source: &dyn HostDocumentSource,
    parser: &dyn DocumentParser,
) -> Result<Arc<str>, SnapshotError> {
    let html = source.outer_html().await?;
    let cleaned = strip_editor_chrome(parser, &html)?;
    info!(bytes = cleaned.len(), "host markup cloned");
    Ok(Arc::from(cleaned))
}

/// Removes editor chrome from `html`: the toolbar, elements marked as editor
/// data, plugin overlays, the root's editor classes and its top margin.
pub fn strip_editor_chrome(parser: &dyn DocumentParser, html: &str) -> Result<String, SnapshotError> {
    let mut doc = parser.parse(html)?;
    doc.set_root_style("margin-top", "0");
    doc.remove_root_classes(&SNAPSHOT_STRIPPED_ROOT_CLASSES);
    for selector in CHROME_SELECTORS {
        let removed = doc.remove_matching(selector);
        debug!(selector, removed, "stripped editor chrome");
    }
    Ok(doc.serialize())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
