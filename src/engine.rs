//! The application pipeline: full passes, cheap re-application, and
//! incremental updates driven by mutation batches.
//!
//! [`DarkModeEngine`] owns the classifier, the original-color cache,
//! and the change-observation subscription. Settings snapshots arrive
//! whole from outside; what happens next depends on where the engine
//! is in its lifecycle:
//!
//! - idle + enabled snapshot: full document-order pass, then attach
//!   the observer and start consuming mutation batches.
//! - observing + enabled snapshot: re-apply from the cache only. No
//!   re-traversal, no re-classification; every cached node is
//!   recomputed from its stored *original* colors under the new
//!   settings, which is what makes slider changes cheap and exact.
//! - disabled snapshot: detach and ask the host to reload. The
//!   transform is not exactly invertible under non-unit brightness or
//!   contrast, so un-inverting in place cannot restore the original
//!   presentation; a reload can.
//!
//! Per-node failures are logged and skipped. A detached node or an
//! unreadable style never aborts a pass or a batch; the worst case is
//! a node the theme did not reach.

use std::collections::HashSet;

use thiserror::Error;

use crate::cache::{OriginalColorCache, OriginalColors};
use crate::classify::{Classification, Classifier};
use crate::color::parse_color;
use crate::observer::ChangeObserver;
use crate::settings::{Settings, SettingsStore};
use crate::transform::invert;
use crate::tree::{Document, MutationKind, MutationRecord, NodeId};

// ============================================================================
// Phase & outcomes
// ============================================================================

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing applied; no subscription held.
    Idle,
    /// A full pass has run and mutation batches are being consumed.
    Observing,
}

/// What a settings snapshot did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Full pass ran; the engine is now observing.
    Applied,
    /// Previously transformed nodes were recomputed from their
    /// originals under the new settings.
    Reapplied,
    /// The theme was switched off. The engine has detached; the host
    /// must reload the content to restore original presentation.
    ReloadRequired,
    /// A disabled snapshot arrived while nothing was applied.
    Unchanged,
}

/// Per-node failures caught at the pipeline boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("node {0} is no longer part of the document")]
    StaleNode(NodeId),
}

// ============================================================================
// DarkModeEngine
// ============================================================================

/// Classification-and-color-transform engine for one document.
///
/// # Example
///
/// ```
/// use umbra_engine::{DarkModeEngine, Document, Settings};
///
/// let mut doc = Document::new();
/// let heading = doc.create_element("h1");
/// doc.set_computed_style(heading, "color", "rgb(10, 10, 10)");
/// doc.append_child(doc.root(), heading);
///
/// let mut engine = DarkModeEngine::new();
/// engine.apply_settings(&mut doc, Settings { enabled: true, ..Settings::default() });
///
/// assert_eq!(doc.style(heading, "color"), Some("rgb(245, 245, 245)"));
/// ```
#[derive(Debug)]
pub struct DarkModeEngine {
    settings: Settings,
    phase: Phase,
    classifier: Classifier,
    cache: OriginalColorCache,
    observer: ChangeObserver,
}

impl DarkModeEngine {
    /// Creates an idle engine with default (disabled) settings.
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            phase: Phase::Idle,
            classifier: Classifier::new(),
            cache: OriginalColorCache::new(),
            observer: ChangeObserver::new(),
        }
    }

    /// Creates an idle engine seeded from the persistence store for a
    /// site. A missing record means defaults; nothing is applied until
    /// [`activate`](Self::activate) or
    /// [`apply_settings`](Self::apply_settings).
    pub fn from_store(store: &dyn SettingsStore, domain: &str) -> Self {
        Self {
            settings: store.settings_for(domain),
            ..Self::new()
        }
    }

    /// The currently-applied settings snapshot, verbatim. This is the
    /// outbound status for control-surface synchronization.
    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn observer(&self) -> &ChangeObserver {
        &self.observer
    }

    /// Applies the engine's current settings, as on initial page
    /// activation.
    pub fn activate(&mut self, doc: &mut Document) -> ApplyOutcome {
        self.apply_settings(doc, self.settings)
    }

    /// Accepts a complete settings snapshot and fully applies it.
    ///
    /// Out-of-range values are clamped, never rejected.
    pub fn apply_settings(&mut self, doc: &mut Document, snapshot: Settings) -> ApplyOutcome {
        let snapshot = snapshot.clamped();
        self.settings = snapshot;

        if !snapshot.enabled {
            return self.disable(doc);
        }
        match self.phase {
            Phase::Idle => {
                self.full_apply(doc);
                ApplyOutcome::Applied
            }
            Phase::Observing => {
                self.reapply(doc);
                ApplyOutcome::Reapplied
            }
        }
    }

    /// Drains and processes pending mutation batches, in delivery
    /// order, until none remain. Later batches produced by the
    /// engine's own writes are consumed too; the cache-reuse contract
    /// makes that follow-up round a no-op, so the loop terminates.
    ///
    /// Returns the number of records handled.
    pub fn process_mutations(&mut self, doc: &mut Document) -> usize {
        let mut handled = 0;
        while let Some(batch) = self.observer.take_batch(doc) {
            handled += self.process_batch(doc, &batch);
        }
        handled
    }

    /// Drops classifier and cache entries for destroyed nodes.
    ///
    /// Without a removal notification from the host, dead entries
    /// accumulate for the lifetime of the page; this is the explicit
    /// maintenance hook for long-lived sessions.
    pub fn sweep(&mut self, doc: &Document) {
        self.classifier.sweep(doc);
        self.cache.sweep(doc);
    }

    // ── Full pass ───────────────────────────────────────────────────

    fn full_apply(&mut self, doc: &mut Document) {
        for id in doc.subtree(doc.root()) {
            let classification = self.classifier.classify(doc, id);
            if !classification.should_invert {
                // Preserved nodes are skipped entirely: no capture,
                // no write.
                continue;
            }
            if let Err(error) = self.transform_node(doc, id, classification) {
                tracing::debug!(%error, "skipping node during full pass");
            }
        }
        // Attach after the pass so the pass's own writes are not
        // re-delivered; the observer covers further change only.
        self.observer = ChangeObserver::attach(doc);
        self.phase = Phase::Observing;
    }

    // ── Settings-change re-application ──────────────────────────────

    fn reapply(&mut self, doc: &mut Document) {
        for id in self.cache.nodes() {
            if !doc.contains(id) {
                self.cache.forget(id);
                self.classifier.forget(id);
                continue;
            }
            let Some(originals) = self.cache.get(id).cloned() else {
                continue;
            };
            // Only the memoized classification is consulted here, for
            // the media-background rule; the node set is the cache.
            let media_now = self.classifier.classify(doc, id).is_media;
            self.write_colors(doc, id, &originals, media_now);
        }
    }

    // ── Disable ─────────────────────────────────────────────────────

    fn disable(&mut self, doc: &mut Document) -> ApplyOutcome {
        if self.phase == Phase::Idle {
            return ApplyOutcome::Unchanged;
        }
        self.observer.detach(doc);
        self.phase = Phase::Idle;
        // The host reloads the content; per-page derived state resets
        // with it.
        self.classifier = Classifier::new();
        self.cache = OriginalColorCache::new();
        ApplyOutcome::ReloadRequired
    }

    // ── Mutation batches ────────────────────────────────────────────

    fn process_batch(&mut self, doc: &mut Document, batch: &[MutationRecord]) -> usize {
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut handled = 0;
        for record in batch {
            // A node referenced by several records in one batch is
            // processed once.
            if !seen.insert(record.target) {
                continue;
            }
            let result = match record.kind {
                MutationKind::ChildInserted => self.apply_subtree(doc, record.target),
                MutationKind::StyleChanged => self.refresh_node(doc, record.target),
            };
            match result {
                Ok(()) => handled += 1,
                Err(error) => tracing::debug!(%error, "skipping mutation record"),
            }
        }
        handled
    }

    /// Handles an insertion: the inserted node and all of its
    /// descendants, since the subtree was not covered by the ambient
    /// subscription until now.
    fn apply_subtree(&mut self, doc: &mut Document, root: NodeId) -> Result<(), EngineError> {
        if !doc.contains(root) {
            return Err(EngineError::StaleNode(root));
        }
        for id in doc.subtree(root) {
            let classification = self.classifier.classify(doc, id);
            if !classification.should_invert {
                continue;
            }
            if let Err(error) = self.transform_node(doc, id, classification) {
                tracing::debug!(%error, "skipping node in inserted subtree");
            }
        }
        Ok(())
    }

    /// Handles a style change: re-classify (the change may have made
    /// the node media) and conditionally re-transform this node only.
    fn refresh_node(&mut self, doc: &mut Document, id: NodeId) -> Result<(), EngineError> {
        if !doc.contains(id) {
            return Err(EngineError::StaleNode(id));
        }
        let classification = self.classifier.reclassify(doc, id);
        if !classification.should_invert {
            return Ok(());
        }
        self.transform_node(doc, id, classification)
    }

    // ── Per-node transform ──────────────────────────────────────────

    fn transform_node(
        &mut self,
        doc: &mut Document,
        id: NodeId,
        classification: Classification,
    ) -> Result<(), EngineError> {
        if !doc.contains(id) {
            return Err(EngineError::StaleNode(id));
        }
        // Capture-or-reuse: the entry always reflects pre-transform
        // state, so recomputation never sees our own output.
        let originals = self.cache.capture(doc, id).clone();
        self.write_colors(doc, id, &originals, classification.is_media);
        Ok(())
    }

    fn write_colors(
        &self,
        doc: &mut Document,
        id: NodeId,
        originals: &OriginalColors,
        media_now: bool,
    ) {
        if let Some(value) = recompute(originals.color.as_deref(), &self.settings) {
            doc.set_style_property(id, "color", &value);
        }
        // Media backgrounds (image fallback colors) stay untouched
        // even when a cache entry exists from before the node became
        // media.
        if !media_now {
            if let Some(value) = recompute(originals.background.as_deref(), &self.settings) {
                doc.set_style_property(id, "background-color", &value);
            }
        }
        if let Some(value) = recompute(originals.border.as_deref(), &self.settings) {
            doc.set_style_property(id, "border-color", &value);
        }
    }
}

impl Default for DarkModeEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Recomputes one color slot from its stored original. Uncaptured
/// slots and unparsable originals yield `None`: leave unchanged.
fn recompute(original: Option<&str>, settings: &Settings) -> Option<String> {
    let rgb = parse_color(original?)?;
    Some(invert(rgb, settings).to_string())
}

// ============================================================================
// Tests
// ============================================================================
