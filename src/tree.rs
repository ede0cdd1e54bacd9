//! Element tree abstraction the engine runs against.
//!
//! [`Document`] is a generational arena of element nodes. Handles
//! ([`NodeId`]) carry a generation alongside their slot index, so a
//! handle to a destroyed node goes stale rather than dangling: every
//! lookup through a stale handle fails silently. That is the weak,
//! non-owning association the classifier memo and the original-color
//! cache rely on; neither keeps a node alive, and neither can
//! resurrect one.
//!
//! Each element carries two style maps:
//!
//! - **computed** — what the rendering engine reports; seeded by the
//!   host (or a test) and read when capturing original colors.
//! - **inline** — what the engine writes. Reads through
//!   [`Document::style`] see inline values over computed ones, the way
//!   inline style wins in a real style cascade.
//!
//! # Mutation recording
//!
//! While observation is on, structural insertions and style-property
//! writes queue [`MutationRecord`]s, coalesced into one batch per
//! [`Document::take_records`] drain. Two rules keep the stream sane:
//! only mutations inside the connected tree are recorded, and writing
//! a style property to its current value records nothing (it is not a
//! mutation).

use std::collections::BTreeMap;

// ============================================================================
// NodeId
// ============================================================================

/// Generational handle to a node in a [`Document`].
///
/// Cheap to copy and safe to hold forever: once the node is destroyed
/// the handle is stale and every lookup returns `None`/`false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

// ============================================================================
// Mutation records
// ============================================================================

/// The two mutation classes the engine subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// A node was inserted under the connected tree. The record names
    /// the inserted node; its descendants are not recorded separately
    /// and must be walked explicitly.
    ChildInserted,
    /// A color-relevant style property of an existing node changed.
    StyleChanged,
}

/// One observed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
}

// ============================================================================
// Document
// ============================================================================

#[derive(Debug)]
struct Node {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    computed: BTreeMap<String, String>,
    inline: BTreeMap<String, String>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            computed: BTreeMap::new(),
            inline: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// An element tree with generational handles and mutation recording.
#[derive(Debug)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    recording: bool,
    pending: Vec<MutationRecord>,
}

impl Document {
    /// Creates a document containing only the root element.
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            recording: false,
            pending: Vec::new(),
        };
        doc.root = doc.allocate(Node::new("html"));
        doc
    }

    /// The root element. Always live; cannot be removed.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Creates a detached element. It joins the tree on
    /// [`append_child`](Self::append_child).
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.allocate(Node::new(tag))
    }

    /// Appends a detached node under a parent.
    ///
    /// Returns `false` when either handle is stale, the child is the
    /// root, or the child already has a parent. Records a
    /// `ChildInserted` mutation when the insertion lands inside the
    /// connected tree.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if child == self.root || parent == child || !self.contains(parent) || !self.contains(child) {
            return false;
        }
        if self.node(child).is_some_and(|n| n.parent.is_some()) {
            return false;
        }

        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }

        if self.recording && self.is_connected(parent) {
            self.pending.push(MutationRecord {
                target: child,
                kind: MutationKind::ChildInserted,
            });
        }
        true
    }

    /// Destroys a node and its whole subtree. Every outstanding handle
    /// into the subtree goes stale. The root cannot be removed.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.contains(id) {
            return false;
        }

        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.children.retain(|&c| c != id);
            }
        }

        for doomed in self.subtree(id) {
            let slot = &mut self.slots[doomed.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(doomed.index);
        }
        true
    }

    /// Whether the handle still refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Whether the node is reachable from the root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// The node's lowercase tag name.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// The node and all its descendants in document order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    // ── Attributes ──────────────────────────────────────────────────

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.attributes.insert(name.to_ascii_lowercase(), value.to_string());
                true
            }
            None => false,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)?.attributes.get(name).map(String::as_str)
    }

    /// Whether the node carries at least one class token.
    pub fn has_classes(&self, id: NodeId) -> bool {
        self.attribute(id, "class")
            .is_some_and(|classes| classes.split_whitespace().next().is_some())
    }

    // ── Styles ──────────────────────────────────────────────────────

    /// Seeds a computed style property. This models what the rendering
    /// engine reports for the node; it is host input, not a mutation.
    pub fn set_computed_style(&mut self, id: NodeId, property: &str, value: &str) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.computed.insert(property.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    /// Reads a style property, inline value over computed.
    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        let node = self.node(id)?;
        node.inline
            .get(property)
            .or_else(|| node.computed.get(property))
            .map(String::as_str)
    }

    /// Writes an inline style property.
    ///
    /// Returns `false` for a stale handle. Writing the value already
    /// present is a no-op and records nothing; an actual change on a
    /// connected node records a `StyleChanged` mutation, including
    /// changes caused by the engine's own writes.
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        if node.inline.get(property).is_some_and(|v| v == value) {
            return true;
        }
        node.inline.insert(property.to_string(), value.to_string());

        if self.recording && self.is_connected(id) {
            self.pending.push(MutationRecord {
                target: id,
                kind: MutationKind::StyleChanged,
            });
        }
        true
    }

    /// The serialized inline style attribute, `None` for a stale
    /// handle. Property order is stable, so equal strings mean equal
    /// inline state.
    pub fn style_attribute(&self, id: NodeId) -> Option<String> {
        let node = self.node(id)?;
        Some(
            node.inline
                .iter()
                .map(|(property, value)| format!("{property}: {value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    // ── Observation ─────────────────────────────────────────────────

    /// Starts recording mutations.
    pub fn observe(&mut self) {
        self.recording = true;
    }

    /// Stops recording and discards anything not yet drained. After
    /// this, no further records are delivered.
    pub fn disconnect(&mut self) {
        self.recording = false;
        self.pending.clear();
    }

    pub fn is_observing(&self) -> bool {
        self.recording
    }

    /// Drains the queued mutations as one coalesced batch, in delivery
    /// order. A single host-side change may produce several records;
    /// consumers must not assume one record per logical change.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.pending)
    }

    // ── Internals ───────────────────────────────────────────────────

    fn allocate(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_go_stale_on_removal() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.append_child(doc.root(), div);
        let span = doc.create_element("span");
        doc.append_child(div, span);

        assert!(doc.remove_node(div));

        // Both the removed node and its descendant are gone.
        assert!(!doc.contains(div));
        assert!(!doc.contains(span));
        assert_eq!(doc.tag(span), None);
        assert_eq!(doc.style(span, "color"), None);
        assert!(!doc.set_style_property(span, "color", "rgb(0, 0, 0)"));
    }

    #[test]
    fn slot_reuse_does_not_revive_old_handles() {
        let mut doc = Document::new();
        let old = doc.create_element("div");
        doc.append_child(doc.root(), old);
        doc.remove_node(old);

        let new = doc.create_element("p");
        // The slot is reused but the generation differs.
        assert!(!doc.contains(old));
        assert!(doc.contains(new));
        assert_ne!(old, new);
    }

    #[test]
    fn subtree_is_document_order() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("p");
        let c = doc.create_element("span");
        let d = doc.create_element("ul");
        doc.append_child(doc.root(), a);
        doc.append_child(a, b);
        doc.append_child(b, c);
        doc.append_child(a, d);

        assert_eq!(doc.subtree(a), vec![a, b, c, d]);
        assert_eq!(doc.subtree(doc.root()), vec![doc.root(), a, b, c, d]);
    }

    #[test]
    fn inline_style_wins_over_computed() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        doc.append_child(doc.root(), p);
        doc.set_computed_style(p, "color", "rgb(10, 10, 10)");

        assert_eq!(doc.style(p, "color"), Some("rgb(10, 10, 10)"));
        doc.set_style_property(p, "color", "rgb(245, 245, 245)");
        assert_eq!(doc.style(p, "color"), Some("rgb(245, 245, 245)"));
    }

    #[test]
    fn insertions_record_only_when_observed_and_connected() {
        let mut doc = Document::new();
        let before = doc.create_element("div");
        doc.append_child(doc.root(), before);

        doc.observe();

        // Building a detached subtree records nothing.
        let detached = doc.create_element("div");
        let inner = doc.create_element("p");
        doc.append_child(detached, inner);
        assert!(doc.take_records().is_empty());

        // Connecting it records one insertion, for the subtree root.
        doc.append_child(doc.root(), detached);
        let records = doc.take_records();
        assert_eq!(
            records,
            vec![MutationRecord {
                target: detached,
                kind: MutationKind::ChildInserted,
            }]
        );
    }

    #[test]
    fn style_writes_record_only_real_changes() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        doc.append_child(doc.root(), p);
        doc.observe();

        doc.set_style_property(p, "color", "rgb(1, 2, 3)");
        assert_eq!(doc.take_records().len(), 1);

        // Same value again: not a mutation.
        doc.set_style_property(p, "color", "rgb(1, 2, 3)");
        assert!(doc.take_records().is_empty());

        doc.set_style_property(p, "color", "rgb(4, 5, 6)");
        assert_eq!(doc.take_records().len(), 1);
    }

    #[test]
    fn disconnect_discards_pending_records() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        doc.append_child(doc.root(), p);
        doc.observe();
        doc.set_style_property(p, "color", "rgb(1, 2, 3)");

        doc.disconnect();
        assert!(doc.take_records().is_empty());

        // Nothing is recorded after disconnect either.
        doc.set_style_property(p, "color", "rgb(9, 9, 9)");
        assert!(doc.take_records().is_empty());
    }

    #[test]
    fn style_attribute_serialization_is_stable() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        doc.append_child(doc.root(), p);

        assert_eq!(doc.style_attribute(p).as_deref(), Some(""));

        doc.set_style_property(p, "color", "rgb(1, 2, 3)");
        doc.set_style_property(p, "background-color", "rgb(4, 5, 6)");
        assert_eq!(
            doc.style_attribute(p).as_deref(),
            Some("background-color: rgb(4, 5, 6); color: rgb(1, 2, 3)")
        );
    }

    #[test]
    fn class_detection() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.append_child(doc.root(), div);

        assert!(!doc.has_classes(div));
        doc.set_attribute(div, "class", "   ");
        assert!(!doc.has_classes(div));
        doc.set_attribute(div, "class", "card highlighted");
        assert!(doc.has_classes(div));
    }
}
