//! # cms-preview-core
//!
//! Shared library for the CMS responsive preview containing the geometry
//! helpers, the device catalog, plugin identity types and the relay message
//! types exchanged between the preview frame and the host document.
//!
//! It has zero dependencies on browser APIs, async runtimes or storage.
//!
//! # Architecture overview
//!
//! The responsive preview renders a clone of the page being edited inside an
//! iframe sized like a phone, tablet or desktop screen.  Pointer events that
//! happen inside the iframe are translated into the host document's coordinate
//! space so the host's plugin highlighting keeps working unmodified.
//!
//! This crate is the shared foundation.  It defines:
//!
//! - **`domain`** – Pure business logic: bounding rectangles over measured
//!   element boxes, the ordered catalog of simulated devices, plugin ordering
//!   inside a placeholder and the scrollbar compensation arithmetic.
//!
//! - **`protocol`** – The messages relayed across the frame boundary
//!   ([`RelayEvent`]), reorder requests, and the well-known storage keys,
//!   marker classes and window names both documents agree on.

pub mod domain;
pub mod protocol;

pub use domain::device::{CatalogError, Device, DeviceCatalog, Dimension};
pub use domain::geometry::{
    compute_bounds, point_in_rect, BoundsOptions, Coordinates, ElementBox, FrameOffset,
    GeometryError, Margins, Point, Size,
};
pub use domain::plugin::{
    plugin_order, swapped_order, ElementKey, MoveDirection, PlaceholderId, PluginDescriptor,
    PluginId,
};
pub use domain::scrollbar::ScrollbarCompensation;
pub use protocol::messages::{EventKind, MoveRequest, RelayEvent, RelayTarget};
