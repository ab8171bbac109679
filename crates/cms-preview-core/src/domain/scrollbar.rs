//! Scrollbar gutter compensation.
//!
//! A fixed-width preview must render its content at exactly the device width.
//! When the frame's document grows a vertical scrollbar, the scrollbar eats
//! into that width, so the frame is widened by the native scrollbar width for
//! as long as the scrollbar is visible.

/// Tracks whether the frame width is currently widened for a scrollbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollbarCompensation {
    requested_width: u32,
    scrollbar_width: u32,
    corrected: bool,
}

impl ScrollbarCompensation {
    pub fn new(requested_width: u32, scrollbar_width: u32) -> Self {
        Self {
            requested_width,
            scrollbar_width,
            corrected: false,
        }
    }

    /// Feeds one observation of the frame's scrollbar state.
    ///
    /// Returns the new frame width when it has to change, `None` otherwise.
    pub fn observe(&mut self, has_vertical_scrollbar: bool) -> Option<u32> {
        match (self.corrected, has_vertical_scrollbar) {
            (false, true) => {
                self.corrected = true;
                Some(self.widened())
            }
            (true, false) => {
                self.corrected = false;
                Some(self.requested_width)
            }
            _ => None,
        }
    }

    /// The frame width implied by the last observation.
    pub fn effective_width(&self) -> u32 {
        if self.corrected {
            self.widened()
        } else {
            self.requested_width
        }
    }

    pub fn is_corrected(&self) -> bool {
        self.corrected
    }

    fn widened(&self) -> u32 {
        self.requested_width.saturating_add(self.scrollbar_width)
    }
}
