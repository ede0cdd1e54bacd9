//! Original-color cache: the single source of truth for re-transforms.
//!
//! The first time a node is transformed, its current text, background,
//! and border colors are read and stored verbatim. Every later
//! recomputation starts from these stored originals, never from the
//! values currently on the node, so applying new settings produces
//! `transform(original, settings)` exactly no matter how many settings
//! changes came before.
//!
//! Entries are keyed by [`NodeId`] and hold no reference into the
//! tree: the association is weak, a stale handle simply stops
//! resolving, and [`OriginalColorCache::sweep`] reclaims entries for
//! destroyed nodes.

use std::collections::HashMap;

use crate::color::is_transparent;
use crate::tree::{Document, NodeId};

// ============================================================================
// OriginalColors
// ============================================================================

/// Pre-transform colors of one node, stored verbatim as read.
///
/// A `None` slot means "not captured": the property was absent or held
/// the fully-transparent sentinel when the node was first transformed.
/// Uncaptured slots are never written during application, which is how
/// transparent backgrounds stay transparent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OriginalColors {
    pub color: Option<String>,
    pub background: Option<String>,
    pub border: Option<String>,
}

// ============================================================================
// OriginalColorCache
// ============================================================================

/// Per-node cache of pre-transform colors.
#[derive(Debug, Default)]
pub struct OriginalColorCache {
    entries: HashMap<NodeId, OriginalColors>,
}

impl OriginalColorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node's entry, creating it from the node's *current*
    /// colors on first call.
    ///
    /// First write wins: later calls return the stored entry unchanged
    /// even if the node's styles have moved on, which is exactly what
    /// keeps the entry pre-transform once the engine starts writing.
    pub fn capture(&mut self, doc: &Document, id: NodeId) -> &OriginalColors {
        self.entries.entry(id).or_insert_with(|| OriginalColors {
            color: read_color(doc, id, "color"),
            background: read_color(doc, id, "background-color"),
            border: read_color(doc, id, "border-color"),
        })
    }

    pub fn get(&self, id: NodeId) -> Option<&OriginalColors> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Drops the entry for a destroyed node.
    pub fn forget(&mut self, id: NodeId) {
        self.entries.remove(&id);
    }

    /// Snapshot of every cached node handle. This is the iteration
    /// set for settings-change re-application: exactly the nodes that
    /// have been transformed before.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.entries.keys().copied().collect()
    }

    /// Drops entries whose nodes no longer exist.
    pub fn sweep(&mut self, doc: &Document) {
        self.entries.retain(|&id, _| doc.contains(id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads one color slot. Transparent values are deliberately not
/// captured so they can never be rewritten.
fn read_color(doc: &Document, id: NodeId, property: &str) -> Option<String> {
    let value = doc.style(id, property)?;
    if is_transparent(value) {
        return None;
    }
    Some(value.to_string())
}

// ============================================================================
// Tests
// ============================================================================
