//! Change observation: feeding tree mutations back into the pipeline.
//!
//! A [`ChangeObserver`] is the engine's subscription to a document's
//! mutation stream. Its lifecycle is strictly one-way: once detached
//! it never re-attaches; a fresh full application constructs a fresh
//! observer instead. Batches are drained in delivery order and a later
//! batch is only seen after the previous one was fully processed.

use crate::tree::{Document, MutationRecord};

// ============================================================================
// ObserverState
// ============================================================================

/// Lifecycle of an observer. `Detached` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    Unattached,
    Attached,
    Detached,
}

// ============================================================================
// ChangeObserver
// ============================================================================

/// Subscription handle over a document's mutation recording.
#[derive(Debug)]
pub struct ChangeObserver {
    state: ObserverState,
}

impl ChangeObserver {
    /// Creates an observer that has never been attached.
    pub fn new() -> Self {
        Self {
            state: ObserverState::Unattached,
        }
    }

    /// Creates an observer and starts recording on the document.
    pub fn attach(doc: &mut Document) -> Self {
        doc.observe();
        Self {
            state: ObserverState::Attached,
        }
    }

    pub fn state(&self) -> ObserverState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        self.state == ObserverState::Attached
    }

    /// Drains the next coalesced mutation batch, or `None` when there
    /// is nothing pending or the observer is not attached.
    pub fn take_batch(&mut self, doc: &mut Document) -> Option<Vec<MutationRecord>> {
        if !self.is_attached() {
            return None;
        }
        let records = doc.take_records();
        if records.is_empty() { None } else { Some(records) }
    }

    /// Stops recording and discards undelivered records. Synchronous:
    /// after this returns, no further batch will ever be delivered
    /// through this observer.
    pub fn detach(&mut self, doc: &mut Document) {
        if self.is_attached() {
            doc.disconnect();
        }
        self.state = ObserverState::Detached;
    }
}

impl Default for ChangeObserver {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
