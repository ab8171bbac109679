//! Geometry domain helpers.
//!
//! All rectangles live in host-document pixel space ("page space").  Element
//! boxes are measured by the infrastructure layer and handed in as plain
//! numbers; nothing here caches a measurement, because layout can change
//! between two calls.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by geometry computations.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    /// The computation needs at least one finite element box.
    #[error("invalid geometry input: {0}")]
    InvalidInput(&'static str),
}

/// A position in page space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub page_x: f64,
    pub page_y: f64,
}

impl Point {
    pub fn new(page_x: f64, page_y: f64) -> Self {
        Self { page_x, page_y }
    }
}

/// Width and height of a measured box (e.g. an overlay control strip).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// An axis-aligned rectangle in page space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Coordinates {
    /// Returns the rightmost X coordinate.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Returns the bottommost Y coordinate.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Grows the rectangle by `padding` on every side.
    ///
    /// The left and top edges are clamped at the page origin and the width is
    /// clamped to `viewport_width`, so an overlay never forces horizontal
    /// scrolling.  The height is not clamped.
    pub fn inflate(&self, padding: f64, viewport_width: f64) -> Coordinates {
        Coordinates {
            left: (self.left - padding).max(0.0),
            top: (self.top - padding).max(0.0),
            width: (self.width + padding * 2.0).min(viewport_width),
            height: self.height + padding * 2.0,
        }
    }

    /// Returns a copy shifted down by `dy`.
    pub fn shifted_down(&self, dy: f64) -> Coordinates {
        Coordinates {
            top: self.top + dy,
            ..*self
        }
    }
}

/// CSS margins of an element as measured.
///
/// `None` stands for a margin that was absent or not numeric (e.g. `auto`);
/// such a margin contributes 0 and never NaN.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
}

impl Margins {
    /// Builds margins from computed CSS strings (`"12px"`, `"auto"`, `""`).
    pub fn from_css(top: &str, right: &str, bottom: &str, left: &str) -> Self {
        Self {
            top: parse_css_px(top),
            right: parse_css_px(right),
            bottom: parse_css_px(bottom),
            left: parse_css_px(left),
        }
    }

    fn resolved(value: Option<f64>) -> f64 {
        value.filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}

/// Parses the leading integer of a CSS length the way `parseInt(v, 10)` does.
///
/// `"12px"` → 12, `"-4px"` → -4, `"7.9px"` → 7, `"auto"` → `None`.
pub fn parse_css_px(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1.0, &trimmed[1..]),
        Some(b'+') => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<f64>().ok().map(|n| sign * n)
}

/// Offset box of one element: page offset plus outer size, plus its margins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementBox {
    pub offset_left: f64,
    pub offset_top: f64,
    pub outer_width: f64,
    pub outer_height: f64,
    pub margins: Margins,
}

impl ElementBox {
    pub fn new(offset_left: f64, offset_top: f64, outer_width: f64, outer_height: f64) -> Self {
        Self {
            offset_left,
            offset_top,
            outer_width,
            outer_height,
            margins: Margins::default(),
        }
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    fn is_finite(&self) -> bool {
        self.offset_left.is_finite()
            && self.offset_top.is_finite()
            && self.outer_width.is_finite()
            && self.outer_height.is_finite()
    }
}

/// Options for [`compute_bounds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsOptions {
    /// Expand every element box by its CSS margins.
    pub with_margins: bool,
    /// Vertical offset of a positioned ancestor (the fixed toolbar pushing the
    /// page down).  Offsets are measured including it, so it is subtracted.
    pub ancestor_offset: f64,
}

impl Default for BoundsOptions {
    fn default() -> Self {
        Self {
            with_margins: true,
            ancestor_offset: 0.0,
        }
    }
}

/// Resolves the ancestor offset of the root element.
///
/// Offsets are only skewed when the root is `position: relative`; a
/// non-numeric margin yields 0.
pub fn ancestor_offset(root_is_relative: bool, root_margin_top: &str) -> f64 {
    if !root_is_relative {
        return 0.0;
    }
    parse_css_px(root_margin_top).unwrap_or(0.0)
}

/// Computes the smallest rectangle enclosing every element box.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidInput`] when `boxes` is empty or contains a
/// non-finite measurement.
pub fn compute_bounds(
    boxes: &[ElementBox],
    options: BoundsOptions,
) -> Result<Coordinates, GeometryError> {
    if boxes.is_empty() {
        return Err(GeometryError::InvalidInput("no elements to measure"));
    }
    if boxes.iter().any(|b| !b.is_finite()) {
        return Err(GeometryError::InvalidInput("non-finite element measurement"));
    }

    let mut x1 = f64::INFINITY;
    let mut y1 = f64::INFINITY;
    let mut x2 = f64::NEG_INFINITY;
    let mut y2 = f64::NEG_INFINITY;

    for b in boxes {
        let (mt, mr, mb, ml) = if options.with_margins {
            (
                Margins::resolved(b.margins.top),
                Margins::resolved(b.margins.right),
                Margins::resolved(b.margins.bottom),
                Margins::resolved(b.margins.left),
            )
        } else {
            (0.0, 0.0, 0.0, 0.0)
        };

        x1 = x1.min(b.offset_left - ml);
        x2 = x2.max(b.offset_left + b.outer_width + mr);
        y1 = y1.min(b.offset_top - mt);
        y2 = y2.max(b.offset_top + b.outer_height + mb);
    }

    let offset = if options.ancestor_offset.is_finite() {
        options.ancestor_offset
    } else {
        0.0
    };

    // The offset skews both the top edge and the bottom edge, so the height
    // is unaffected.
    Ok(Coordinates {
        left: x1,
        top: y1 - offset,
        width: x2 - x1,
        height: y2 - y1,
    })
}

/// Returns `true` when `point` lies inside `rect`, edges included.
pub fn point_in_rect(point: Point, rect: &Coordinates) -> bool {
    point.page_x >= rect.left
        && point.page_x <= rect.right()
        && point.page_y >= rect.top
        && point.page_y <= rect.bottom()
}

/// Page offset of the preview wrapper inside the host document.
///
/// The frame's client coordinates start at the wrapper's top-left corner, so
/// translating between the two documents is a plain translation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameOffset {
    pub left: f64,
    pub top: f64,
}

impl FrameOffset {
    pub fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }

    /// Frame-local client coordinates → host page coordinates.
    pub fn to_host(&self, client_x: f64, client_y: f64) -> Point {
        Point {
            page_x: client_x + self.left,
            page_y: client_y + self.top,
        }
    }

    /// Host page coordinates → frame-local client coordinates.
    pub fn to_frame(&self, point: Point) -> (f64, f64) {
        (point.page_x - self.left, point.page_y - self.top)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
