//! Application layer use cases for the responsive preview.
//!
//! Use cases in this layer orchestrate the domain types from
//! `cms_preview_core` and reach the browser only through traits ("ports")
//! injected at construction time.  Nothing here touches a real document, so
//! every use case is unit-testable with the in-memory adapters from
//! `infrastructure::dom::mock`.
//!
//! # Sub-modules
//!
//! - **`context`**  – The explicit context object: persistent store, device
//!   catalog, timings and the registry of live overlays.
//! - **`resizer`**  – Device picker and simulated-viewport chrome, including
//!   the scrollbar compensation loop.
//! - **`snapshot`** – Memoized, cleaned clone of the host document markup.
//! - **`relay`**    – Re-targets pointer and keyboard events from the preview
//!   frame onto the host document.
//! - **`escape`**   – Keeps the cloned page from opening a preview inside the
//!   preview.
//! - **`preview`**  – The Closed/Open controller tying the above together.
//! - **`overlay`**  – Per-plugin floating move/delete controls.

pub mod context;
pub mod escape;
pub mod overlay;
pub mod preview;
pub mod relay;
pub mod resizer;
pub mod snapshot;
