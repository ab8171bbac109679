//! Well-known names shared by the host document, the preview frame and the
//! persistent store.
//!
//! These are the contract with the server-rendered toolbar markup; changing
//! one of them requires changing the templates as well.

/// Storage key of the last selected device.
pub const DEVICE_STORAGE_KEY: &str = "cms-responsive-viewer";

/// Storage key of the one-shot "re-open the preview after the reload" flag.
pub const REACTIVATE_STORAGE_KEY: &str = "cms-responsive-view-activate";

/// Window name given to the preview frame.
///
/// A document that finds itself running in a window with this name is the
/// cloned page and must escape to the top-level context.
pub const PREVIEW_WINDOW_NAME: &str = "cms-responsive-preview-frame";

/// Class of the preview frame element (reused across open/close cycles).
pub const PREVIEW_FRAME_CLASS: &str = "cms-responsive-preview-frame";

/// Selectors of CMS chrome removed from every snapshot.
pub const CHROME_SELECTORS: [&str; 3] = ["#cms-top", "[data-cms]", ".cms-plugin-overlay"];

/// Root element classes that only make sense on the live editing page.
pub const SNAPSHOT_STRIPPED_ROOT_CLASSES: [&str; 6] = [
    "cms-overflow",
    "cms-responsive-overflow",
    "cms-structure-mode-content",
    "cms-structure-mode-structure",
    "cms-toolbar-expanded",
    "cms-ready",
];

/// Root class that disables scrolling of the host while the preview is open.
pub const RESPONSIVE_OVERFLOW_CLASS: &str = "cms-responsive-overflow";

/// Class marking plugin elements.
pub const PLUGIN_CLASS: &str = "cms-plugin";

/// Class marking elements whose native click must reach the page untouched
/// (in-place editing targets).
pub const RENDER_MODEL_CLASS: &str = "cms-render-model";

/// Attribute carrying the stable cross-document [`ElementKey`].
///
/// [`ElementKey`]: crate::domain::plugin::ElementKey
pub const PLUGIN_KEY_ATTRIBUTE: &str = "data-cms-plugin-key";

/// Namespace of every listener attached inside the preview frame, so they can
/// all be detached at once on close.
pub const FRAME_LISTENER_NAMESPACE: &str = "cms.responsive";

/// Active marker on the toolbar trigger button.
pub const TRIGGER_ACTIVE_CLASS: &str = "cms-btn-active";
