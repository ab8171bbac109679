//! The explicit preview context.
//!
//! Everything the preview used to keep in page-global state lives here and is
//! handed to constructors: the persistent key/value store, the validated
//! device catalog, the timing knobs and the registry of live overlays.

use std::sync::Arc;
use std::time::Duration;

use cms_preview_core::protocol::markers::DEVICE_STORAGE_KEY;
use cms_preview_core::{Device, DeviceCatalog};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::overlay::OverlayRegistry;

/// Error type for key/value store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("stored value for {key:?} is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error in storage backend: {0}")]
    Io(#[from] std::io::Error),
}

/// Small persistent key/value store (the browser's local storage).
///
/// Values are JSON so the persisted device keeps its exact
/// `{"name":…,"width":…,"height":…}` shape.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Delays and intervals used by the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewTimings {
    /// Wait after the frame's load event before wiring listeners.
    pub settle_delay: Duration,
    /// Length of the wrapper resize transition.
    pub transition: Duration,
    /// Scrollbar probe interval when no layout notifications are available.
    pub scrollbar_poll: Duration,
    /// Quiet period before an overlay re-checks the pointer position.
    pub overlay_debounce: Duration,
}

impl Default for PreviewTimings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(50),
            transition: Duration::from_millis(150),
            scrollbar_poll: Duration::from_millis(16),
            overlay_debounce: Duration::ZERO,
        }
    }
}

/// Behavioural settings that are not timings.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSettings {
    /// Key name of the "expand scope" modifier.
    pub expand_key: String,
    /// Language sent with plugin reorder requests.
    pub target_language: String,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            expand_key: "Shift".to_string(),
            target_language: "en".to_string(),
        }
    }
}

/// Context object shared by the preview controller and the overlays.
pub struct PreviewContext {
    pub store: Arc<dyn KeyValueStore>,
    pub catalog: DeviceCatalog,
    pub timings: PreviewTimings,
    pub settings: PreviewSettings,
    pub overlays: OverlayRegistry,
}

impl PreviewContext {
    pub fn new(store: Arc<dyn KeyValueStore>, catalog: DeviceCatalog) -> Self {
        Self {
            store,
            catalog,
            timings: PreviewTimings::default(),
            settings: PreviewSettings::default(),
            overlays: OverlayRegistry::default(),
        }
    }

    pub fn with_timings(mut self, timings: PreviewTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_settings(mut self, settings: PreviewSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The last selected device, or the catalog default.
    pub fn current_device(&self) -> Device {
        load_device(self.store.as_ref(), &self.catalog)
    }

    /// Tears down every live overlay (structure/content mode switch).
    pub fn mode_switched(&mut self) -> usize {
        self.overlays.destroy_all()
    }
}

/// Reads the persisted device, falling back to the catalog default when the
/// key is absent, unreadable or malformed.
pub fn load_device(store: &dyn KeyValueStore, catalog: &DeviceCatalog) -> Device {
    match store.get(DEVICE_STORAGE_KEY) {
        Ok(Some(value)) => match serde_json::from_value::<Device>(value) {
            Ok(device) => device,
            Err(e) => {
                warn!("ignoring malformed stored device: {e}");
                catalog.default_device().clone()
            }
        },
        Ok(None) => {
            debug!("no stored device, using catalog default");
            catalog.default_device().clone()
        }
        Err(e) => {
            warn!("device store unavailable: {e}");
            catalog.default_device().clone()
        }
    }
}

/// Persists `device` as the current device.  Failures are logged; the
/// preview keeps working with the in-memory selection.
pub fn persist_device(store: &dyn KeyValueStore, device: &Device) {
    let value = match serde_json::to_value(device) {
        Ok(value) => value,
        Err(e) => {
            warn!("could not serialize device {:?}: {e}", device.name);
            return;
        }
    };
    if let Err(e) = store.set(DEVICE_STORAGE_KEY, value) {
        warn!("could not persist device {:?}: {e}", device.name);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_load_device_falls_back_to_default_when_absent() {
        let store = MemoryStore::new();
        let device = load_device(&store, &DeviceCatalog::default());
        assert_eq!(device, Device::auto("Auto"));
    }

    #[test]
    fn test_load_device_falls_back_to_default_when_malformed() {
        let store = MemoryStore::new();
        store.set(DEVICE_STORAGE_KEY, json!({"name": 5})).unwrap();

        let device = load_device(&store, &DeviceCatalog::default());

        assert_eq!(device, Device::auto("Auto"));
    }

    #[test]
    fn test_persist_then_load_returns_rotated_device_unchanged() {
        let store = MemoryStore::new();
        let rotated = Device::fixed("iPad", 1024, 768);

        persist_device(&store, &rotated);

        assert_eq!(load_device(&store, &DeviceCatalog::default()), rotated);
        assert_eq!(
            store.get(DEVICE_STORAGE_KEY).unwrap(),
            Some(json!({"name": "iPad", "width": 1024, "height": 768}))
        );
    }

    #[test]
    fn test_default_timings_match_preview_behaviour() {
        let t = PreviewTimings::default();
        assert_eq!(t.settle_delay, Duration::from_millis(50));
        assert_eq!(t.transition, Duration::from_millis(150));
        assert_eq!(t.scrollbar_poll, Duration::from_millis(16));
    }
}
