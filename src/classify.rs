//! Node classification: what an element is, and whether to touch it.
//!
//! Classification is derived entirely from the node's tag, attributes,
//! ancestry, and computed style, and is memoized per node: after the
//! first call, classifying the same node is a map lookup. The memo is
//! refreshed only through [`Classifier::reclassify`] (the style-change
//! path) and dropped through [`Classifier::forget`] or
//! [`Classifier::sweep`] when nodes are destroyed.

use std::collections::HashMap;

use crate::tree::{Document, NodeId};

/// Tags treated as media regardless of content.
const MEDIA_TAGS: &[&str] = &["img", "video", "canvas", "svg", "iframe", "picture"];

/// Inline and text-bearing tags.
const TEXT_TAGS: &[&str] = &[
    "p", "span", "a", "h1", "h2", "h3", "h4", "h5", "h6", "li", "td", "th", "label", "button",
];

/// Block and structural tags.
const CONTAINER_TAGS: &[&str] = &[
    "html",
    "body",
    "div",
    "section",
    "article",
    "aside",
    "header",
    "footer",
    "main",
    "nav",
    "ul",
    "ol",
    "table",
    "form",
    "blockquote",
];

// ============================================================================
// Classification
// ============================================================================

/// The capability profile and decision for one node.
///
/// The three capability flags are independent; the two decision flags
/// are mutually exclusive. Media is never color-transformed; everything
/// else is inverted. The text/container distinction is informational in
/// the current policy and carried for callers that want to build on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_media: bool,
    pub is_text: bool,
    pub is_container: bool,
    pub should_invert: bool,
    pub should_preserve: bool,
}

// ============================================================================
// Classifier
// ============================================================================

/// Memoizing classifier over a [`Document`].
#[derive(Debug, Default)]
pub struct Classifier {
    memo: HashMap<NodeId, Classification>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies a node, memoized for the node's lifetime.
    ///
    /// A stale handle yields the inert default profile (nothing to
    /// preserve, nothing to invert) and is not memoized.
    pub fn classify(&mut self, doc: &Document, id: NodeId) -> Classification {
        if let Some(&cached) = self.memo.get(&id) {
            return cached;
        }
        if !doc.contains(id) {
            return Classification::default();
        }
        let classification = compute(doc, id);
        self.memo.insert(id, classification);
        classification
    }

    /// Recomputes a node's classification, replacing the memo entry.
    /// Used when a node's style attribute changes, since a new
    /// background image can turn an ordinary node into media.
    pub fn reclassify(&mut self, doc: &Document, id: NodeId) -> Classification {
        if !doc.contains(id) {
            self.memo.remove(&id);
            return Classification::default();
        }
        let classification = compute(doc, id);
        self.memo.insert(id, classification);
        classification
    }

    /// Drops the memo entry for a destroyed node.
    pub fn forget(&mut self, id: NodeId) {
        self.memo.remove(&id);
    }

    /// Drops every memo entry whose node no longer exists. Growth is
    /// otherwise bounded only by page lifetime.
    pub fn sweep(&mut self, doc: &Document) {
        self.memo.retain(|&id, _| doc.contains(id));
    }

    #[cfg(test)]
    fn memo_len(&self) -> usize {
        self.memo.len()
    }
}

fn compute(doc: &Document, id: NodeId) -> Classification {
    let tag = doc.tag(id).unwrap_or_default();

    let is_media = MEDIA_TAGS.contains(&tag)
        || inside_vector_graphic(doc, id)
        || has_background_image(doc, id)
        || has_embedded_media_payload(doc, id);
    let is_text = TEXT_TAGS.contains(&tag);
    let is_container = CONTAINER_TAGS.contains(&tag) || doc.has_classes(id);

    // Media wins outright; everything else is inverted, text and
    // container alike.
    Classification {
        is_media,
        is_text,
        is_container,
        should_invert: !is_media,
        should_preserve: is_media,
    }
}

/// Anything inside an `svg` element renders as part of the graphic.
fn inside_vector_graphic(doc: &Document, id: NodeId) -> bool {
    let mut current = doc.parent(id);
    while let Some(ancestor) = current {
        if doc.tag(ancestor) == Some("svg") {
            return true;
        }
        current = doc.parent(ancestor);
    }
    false
}

fn has_background_image(doc: &Document, id: NodeId) -> bool {
    doc.style(id, "background-image")
        .is_some_and(|value| value != "none")
}

/// A `src` or `data` attribute carrying an inline image or video
/// payload marks the node as media even when its tag does not.
fn has_embedded_media_payload(doc: &Document, id: NodeId) -> bool {
    ["src", "data"].iter().any(|name| {
        doc.attribute(id, name)
            .is_some_and(|value| value.contains("data:image/") || value.contains("data:video/"))
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(tag: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let id = doc.create_element(tag);
        doc.append_child(doc.root(), id);
        (doc, id)
    }

    #[test]
    fn media_tags_are_preserved() {
        for tag in ["img", "video", "canvas", "svg", "iframe", "picture"] {
            let (doc, id) = doc_with(tag);
            let c = Classifier::new().classify(&doc, id);
            assert!(c.is_media, "{tag} should be media");
            assert!(c.should_preserve);
            assert!(!c.should_invert);
        }
    }

    #[test]
    fn text_tags_are_inverted() {
        for tag in ["p", "span", "a", "h1", "h6", "li", "td", "label", "button"] {
            let (doc, id) = doc_with(tag);
            let c = Classifier::new().classify(&doc, id);
            assert!(c.is_text, "{tag} should be text");
            assert!(c.should_invert);
            assert!(!c.should_preserve);
        }
    }

    #[test]
    fn container_tags_and_classed_nodes() {
        let (doc, id) = doc_with("section");
        assert!(Classifier::new().classify(&doc, id).is_container);

        // An unknown tag with a class annotation still counts as a
        // container.
        let (mut doc, id) = doc_with("x-widget");
        doc.set_attribute(id, "class", "sidebar");
        let c = Classifier::new().classify(&doc, id);
        assert!(c.is_container);
        assert!(c.should_invert);
    }

    #[test]
    fn svg_descendants_are_media() {
        let mut doc = Document::new();
        let svg = doc.create_element("svg");
        let group = doc.create_element("g");
        let shape = doc.create_element("path");
        doc.append_child(doc.root(), svg);
        doc.append_child(svg, group);
        doc.append_child(group, shape);

        let mut classifier = Classifier::new();
        assert!(classifier.classify(&doc, shape).is_media);
        assert!(classifier.classify(&doc, group).should_preserve);
    }

    #[test]
    fn background_image_makes_media() {
        let (mut doc, id) = doc_with("div");
        doc.set_computed_style(id, "background-image", "url(hero.png)");
        assert!(Classifier::new().classify(&doc, id).is_media);

        let (mut doc, id) = doc_with("div");
        doc.set_computed_style(id, "background-image", "none");
        assert!(!Classifier::new().classify(&doc, id).is_media);
    }

    #[test]
    fn embedded_payload_makes_media() {
        let (mut doc, id) = doc_with("object");
        doc.set_attribute(id, "data", "data:image/png;base64,AAAA");
        assert!(Classifier::new().classify(&doc, id).is_media);

        let (mut doc, id) = doc_with("span");
        doc.set_attribute(id, "src", "data:video/mp4;base64,AAAA");
        assert!(Classifier::new().classify(&doc, id).is_media);

        // An ordinary URL is not an embedded payload.
        let (mut doc, id) = doc_with("span");
        doc.set_attribute(id, "src", "https://example.com/clip.mp4");
        assert!(!Classifier::new().classify(&doc, id).is_media);
    }

    #[test]
    fn classification_is_memoized() {
        let (mut doc, id) = doc_with("div");
        let mut classifier = Classifier::new();

        let first = classifier.classify(&doc, id);
        // A later style change is not seen until reclassify.
        doc.set_computed_style(id, "background-image", "url(x.png)");
        assert_eq!(classifier.classify(&doc, id), first);

        let refreshed = classifier.reclassify(&doc, id);
        assert!(refreshed.is_media);
        assert_eq!(classifier.classify(&doc, id), refreshed);
    }

    #[test]
    fn stale_nodes_classify_inert_and_are_not_memoized() {
        let (mut doc, id) = doc_with("p");
        doc.remove_node(id);

        let mut classifier = Classifier::new();
        let c = classifier.classify(&doc, id);
        assert!(!c.should_invert);
        assert!(!c.should_preserve);
        assert_eq!(classifier.memo_len(), 0);
    }

    #[test]
    fn sweep_drops_destroyed_nodes() {
        let mut doc = Document::new();
        let keep = doc.create_element("p");
        let drop = doc.create_element("p");
        doc.append_child(doc.root(), keep);
        doc.append_child(doc.root(), drop);

        let mut classifier = Classifier::new();
        classifier.classify(&doc, keep);
        classifier.classify(&doc, drop);
        assert_eq!(classifier.memo_len(), 2);

        doc.remove_node(drop);
        classifier.sweep(&doc);
        assert_eq!(classifier.memo_len(), 1);
    }
}
