//! Per-thread context slot
//!
//! A [`ContextSlot`] holds one transaction's identifier, metadata and nesting
//! depth. Slots are always handled through `Arc` so that a decorated unit of
//! work can carry a reference to the very slot its originating thread uses;
//! identity (`Arc::ptr_eq`) is what the binding logic compares.

use crate::metadata::MetadataMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use strand_core::TransactionId;

/// Transaction identifier, metadata and nesting depth of one context
#[derive(Debug)]
pub struct ContextSlot {
    transaction_id: RwLock<TransactionId>,
    metadata: MetadataMap,
    depth: AtomicUsize,
}

impl ContextSlot {
    /// Slot opened by `create()`, at depth 1
    pub(crate) fn begin(transaction_id: TransactionId) -> Self {
        Self {
            transaction_id: RwLock::new(transaction_id),
            metadata: MetadataMap::new(),
            depth: AtomicUsize::new(1),
        }
    }

    /// Depth-0 slot installed lazily by `set()` or `put_metadata()`
    pub(crate) fn detached() -> Self {
        Self {
            transaction_id: RwLock::new(TransactionId::uninitialized()),
            metadata: MetadataMap::new(),
            depth: AtomicUsize::new(0),
        }
    }

    /// Current transaction identifier
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id.read().clone()
    }

    /// Whether the identifier differs from the sentinel
    pub fn is_initialized(&self) -> bool {
        !self.transaction_id.read().is_uninitialized()
    }

    pub(crate) fn set_transaction_id(&self, transaction_id: TransactionId) {
        *self.transaction_id.write() = transaction_id;
    }

    /// The shared metadata map
    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    /// Increment depth unless the slot has already reached zero
    ///
    /// Returns the new depth.
    pub(crate) fn try_enter(&self) -> Option<usize> {
        self.depth
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |d| {
                if d == 0 {
                    None
                } else {
                    Some(d + 1)
                }
            })
            .ok()
            .map(|previous| previous + 1)
    }

    /// Decrement depth, saturating at zero
    ///
    /// Returns the new depth, or `None` if the slot was already at zero.
    pub(crate) fn exit(&self) -> Option<usize> {
        self.depth
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |d| d.checked_sub(1))
            .ok()
            .map(|previous| previous - 1)
    }

    /// Wipe metadata and reset the identifier to the sentinel
    pub(crate) fn tear_down(&self) {
        self.metadata.clear();
        self.set_transaction_id(TransactionId::uninitialized());
    }
}
