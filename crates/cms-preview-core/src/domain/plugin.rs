//! Plugin and placeholder identity.
//!
//! Plugins are the content blocks inside a placeholder.  Every rendered plugin
//! element carries a list of descriptors (one per nesting level of the render
//! tree); the last one describes the element itself.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Numeric plugin identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PluginId(pub u64);

/// Numeric placeholder identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaceholderId(pub u64);

impl std::fmt::Display for PluginId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier joining an element in the preview frame to the same
/// element in the host document.
///
/// Carried by the `data-cms-plugin-key` attribute.  Both documents are
/// rendered from the same markup, so the key is identical on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementKey(pub String);

impl ElementKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One descriptor attached to a rendered plugin element.
///
/// Ids arrive either as JSON numbers or as numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub plugin_id: RawId,
    #[serde(default)]
    pub placeholder_id: Option<RawId>,
}

/// An identifier as found in markup: number or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            RawId::Number(n) => Some(*n),
            RawId::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl PluginDescriptor {
    pub fn new(plugin_id: u64, placeholder_id: u64) -> Self {
        Self {
            plugin_id: RawId::Number(plugin_id),
            placeholder_id: Some(RawId::Number(placeholder_id)),
        }
    }
}

/// Computes the order of plugins inside a placeholder.
///
/// `elements` holds, in document order, the descriptor list of every plugin
/// element of the placeholder.  The last descriptor of each list identifies
/// the element.  Ids are deduplicated keeping the first occurrence (a plugin
/// can render more than one element); non-numeric ids are skipped.
pub fn plugin_order(elements: &[Vec<PluginDescriptor>]) -> Vec<PluginId> {
    let mut order: Vec<PluginId> = Vec::with_capacity(elements.len());
    for descriptors in elements {
        let Some(last) = descriptors.last() else {
            continue;
        };
        match last.plugin_id.as_u64() {
            Some(id) => {
                let id = PluginId(id);
                if !order.contains(&id) {
                    order.push(id);
                }
            }
            None => debug!(raw = ?last.plugin_id, "skipping non-numeric plugin id"),
        }
    }
    order
}

/// Direction of a single-step reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Swaps the plugin at `index` with its neighbour in `direction`.
///
/// Returns `None` when the move would leave the list (first plugin moving up,
/// last plugin moving down) or when `index` is out of range.
pub fn swapped_order(
    order: &[PluginId],
    index: usize,
    direction: MoveDirection,
) -> Option<(Vec<PluginId>, usize)> {
    if index >= order.len() {
        return None;
    }
    let target = match direction {
        MoveDirection::Up => index.checked_sub(1)?,
        MoveDirection::Down => {
            let next = index + 1;
            if next >= order.len() {
                return None;
            }
            next
        }
    };
    let mut next = order.to_vec();
    next.swap(index, target);
    Some((next, target))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
