//! Domain entities for the responsive preview.
//!
//! This module contains pure business logic with no infrastructure
//! dependencies: nothing in here touches a document, a timer or a store.
//! Measurements come in as plain numbers and results go out as plain values,
//! so every rule can be unit-tested on any platform.

/// Bounding rectangles, hit testing and frame/host coordinate translation.
pub mod geometry;

/// The ordered catalog of simulated viewport sizes.
pub mod device;

/// Plugin and placeholder identity, plugin ordering.
pub mod plugin;

/// Scrollbar gutter compensation for fixed-width previews.
pub mod scrollbar;
