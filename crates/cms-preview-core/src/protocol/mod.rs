//! What crosses the frame boundary: relay messages, reorder requests and the
//! names both documents agree on.

pub mod markers;
pub mod messages;
