//! Transaction context store
//!
//! [`ContextStore`] maps each live thread to the [`ContextSlot`] currently
//! bound to it. Every public operation acts on the calling thread's slot.
//!
//! # Design
//!
//! - DashMap keyed by `ThreadId`: sharded, so unrelated threads rarely touch
//!   the same lock
//! - Slots are `Arc`s: decorators bind the originating thread's slot onto the
//!   executing thread and unbind it by identity
//! - The store is an ordinary value; hosts own it (usually behind an `Arc`)
//!   rather than keeping slots in a thread local, which keeps teardown and
//!   test isolation explicit
//! - A thread's entry goes away with the thread: the first insertion for a
//!   thread registers a thread-exit guard that removes it, so slots left by
//!   `set`/`put_metadata` without `create`, or by a missing `destroy`, do
//!   not outlive their thread
//!
//! # Lifecycle
//!
//! ```text
//! create()  depth 0 → 1   fresh slot, new id, TransactionBegin published
//! create()  depth 1 → 2   same slot, same id
//! destroy() depth 2 → 1
//! destroy() depth 1 → 0   TransactionEnd published, slot wiped and unbound
//! destroy() depth 0       no-op
//! ```

use crate::hook::{ErrorHook, LoggingHook};
use crate::slot::ContextSlot;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use strand_core::{
    generate_transaction_id, is_reserved_key, Error, Result, StrandConfig, TransactionId, Value,
};
use strand_events::{Event, EventBus, EventKind, ORIGIN_CORE};
use tracing::{debug, trace};

type SlotMap = DashMap<ThreadId, Arc<ContextSlot>>;

/// Process-wide registry of per-thread transaction contexts
pub struct ContextStore {
    /// Slot bound to each thread
    slots: Arc<SlotMap>,

    /// Bus receiving lifecycle events, if any
    events: Option<Arc<EventBus>>,

    /// Whether lifecycle events are published at all
    publish_lifecycle: bool,

    /// Receives reserved-key misuse reports
    error_hook: RwLock<Arc<dyn ErrorHook>>,
}

impl ContextStore {
    /// Create a store with default configuration and no event bus
    pub fn new() -> Self {
        Self::with_config(&StrandConfig::default(), None)
    }

    /// Create a store publishing lifecycle events to `events`
    pub fn with_config(config: &StrandConfig, events: Option<Arc<EventBus>>) -> Self {
        Self {
            slots: Arc::new(DashMap::with_capacity(config.initial_capacity)),
            events,
            publish_lifecycle: config.publish_lifecycle_events,
            error_hook: RwLock::new(Arc::new(LoggingHook)),
        }
    }

    /// Replace the error hook
    pub fn install_error_hook(&self, hook: Arc<dyn ErrorHook>) {
        *self.error_hook.write() = hook;
    }

    /// The attached event bus, if any
    pub fn event_bus(&self) -> Option<&Arc<EventBus>> {
        self.events.as_ref()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Enter a transaction context on the calling thread
    ///
    /// At depth 0 a fresh slot with a newly generated identifier is bound;
    /// otherwise only the depth is incremented. Returns the new depth.
    pub fn create(&self) -> usize {
        if let Some(depth) = self.current_slot().and_then(|slot| slot.try_enter()) {
            return depth;
        }

        let slot = Arc::new(ContextSlot::begin(generate_transaction_id()));
        self.slots.insert(current_thread(), Arc::clone(&slot));
        self.watch_thread_exit();
        debug!(transaction_id = %slot.transaction_id(), "Transaction context created");
        self.publish_lifecycle(Event::new(ORIGIN_CORE, EventKind::TransactionBegin));
        1
    }

    /// Leave a transaction context on the calling thread
    ///
    /// When the depth reaches zero the slot's metadata is wiped, its
    /// identifier reset to the sentinel and the slot unbound. Calling this
    /// with no matching `create()` does nothing.
    pub fn destroy(&self) {
        let Some(slot) = self.current_slot() else {
            return;
        };
        if slot.exit() != Some(0) {
            return;
        }

        self.publish_lifecycle(Event::new(ORIGIN_CORE, EventKind::TransactionEnd));
        debug!(transaction_id = %slot.transaction_id(), "Transaction context destroyed");
        slot.tear_down();
        self.slots
            .remove_if(&current_thread(), |_, bound| Arc::ptr_eq(bound, &slot));
    }

    /// Unbind whatever slot the calling thread holds, regardless of depth
    ///
    /// The slot itself is left intact for any decorated work still holding it.
    pub fn clear(&self) {
        self.slots.remove(&current_thread());
    }

    /// Drop every binding on every thread
    pub fn reset(&self) {
        self.slots.clear();
    }

    /// Number of live threads with a bound slot
    pub fn active_slots(&self) -> usize {
        self.slots.len()
    }

    // ========================================================================
    // Transaction identifier
    // ========================================================================

    /// Override the calling thread's transaction identifier
    pub fn set(&self, transaction_id: impl Into<TransactionId>) {
        self.slot_or_install().set_transaction_id(transaction_id.into());
    }

    /// The calling thread's transaction identifier, or the sentinel
    pub fn get(&self) -> TransactionId {
        self.current_slot()
            .map(|slot| slot.transaction_id())
            .unwrap_or_default()
    }

    /// The "no active transaction" sentinel
    pub fn uninitialized_value() -> TransactionId {
        TransactionId::uninitialized()
    }

    /// Heuristic: is the calling thread inside a created context?
    ///
    /// True when the bound slot has a non-zero depth. This distinguishes
    /// activity work from steady-state background work only as long as pooled
    /// threads are cleaned up after each activity and activities do not
    /// lazily start long-lived workers, which would inherit the context.
    pub fn is_within_created_context(&self) -> bool {
        self.current_slot().map_or(false, |slot| slot.depth() > 0)
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Store a metadata value on the calling thread's context
    pub fn put_metadata(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.check_key(key)?;
        self.slot_or_install().metadata().put(key, value.into());
        Ok(())
    }

    /// Read a metadata value
    pub fn get_metadata(&self, key: &str) -> Result<Option<Value>> {
        self.check_key(key)?;
        Ok(self.current_slot().and_then(|slot| slot.metadata().get(key)))
    }

    /// Remove a metadata value and its tags
    pub fn remove_metadata(&self, key: &str) -> Result<Option<Value>> {
        self.check_key(key)?;
        Ok(self.current_slot().and_then(|slot| slot.metadata().remove(key)))
    }

    /// Attach a tag to an existing metadata key
    pub fn set_metadata_tag(&self, key: &str, tag: &str) -> Result<()> {
        self.check_key(key)?;
        let found = self
            .current_slot()
            .map_or(false, |slot| slot.metadata().set_tag(key, tag));
        if found {
            Ok(())
        } else {
            Err(missing(key))
        }
    }

    /// Detach a tag from an existing metadata key
    pub fn clear_metadata_tag(&self, key: &str, tag: &str) -> Result<()> {
        self.check_key(key)?;
        let found = self
            .current_slot()
            .map_or(false, |slot| slot.metadata().clear_tag(key, tag));
        if found {
            Ok(())
        } else {
            Err(missing(key))
        }
    }

    /// Whether an existing metadata key carries a tag
    pub fn has_metadata_tag(&self, key: &str, tag: &str) -> Result<bool> {
        self.check_key(key)?;
        self.current_slot()
            .and_then(|slot| slot.metadata().has_tag(key, tag))
            .ok_or_else(|| missing(key))
    }

    /// Snapshot of the calling thread's metadata carrying `tag`
    pub fn get_metadata_with_tag(&self, tag: &str) -> HashMap<String, Value> {
        self.current_slot()
            .map(|slot| slot.metadata().with_tag(tag))
            .unwrap_or_default()
    }

    // ========================================================================
    // Binding (used by the concurrency decorators)
    // ========================================================================

    /// The slot bound to the calling thread
    pub fn current_slot(&self) -> Option<Arc<ContextSlot>> {
        self.slots
            .get(&current_thread())
            .map(|bound| Arc::clone(bound.value()))
    }

    /// Bind `slot` to the calling thread, returning the displaced binding
    pub fn bind(&self, slot: Arc<ContextSlot>) -> Option<Arc<ContextSlot>> {
        let previous = self.slots.insert(current_thread(), slot);
        if previous.is_none() {
            self.watch_thread_exit();
        }
        previous
    }

    /// Undo a [`bind`](Self::bind), but only if `slot` is still the binding
    ///
    /// Restores `previous` when given. Returns whether anything changed.
    pub fn unbind_if(&self, slot: &Arc<ContextSlot>, previous: Option<Arc<ContextSlot>>) -> bool {
        let thread = current_thread();
        match previous {
            None => self
                .slots
                .remove_if(&thread, |_, bound| Arc::ptr_eq(bound, slot))
                .is_some(),
            Some(previous) => match self.slots.get_mut(&thread) {
                Some(mut bound) if Arc::ptr_eq(&*bound, slot) => {
                    *bound = previous;
                    true
                }
                _ => false,
            },
        }
    }

    /// Publish a lifecycle event if a bus is attached and publishing enabled
    pub fn publish_lifecycle(&self, event: Event) {
        if !self.publish_lifecycle {
            return;
        }
        if let Some(bus) = &self.events {
            bus.publish(&event);
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn slot_or_install(&self) -> Arc<ContextSlot> {
        if let Some(slot) = self.current_slot() {
            return slot;
        }
        let slot = Arc::clone(
            self.slots
                .entry(current_thread())
                .or_insert_with(|| Arc::new(ContextSlot::detached()))
                .value(),
        );
        self.watch_thread_exit();
        slot
    }

    /// Remove the calling thread's entry from this store when the thread exits
    fn watch_thread_exit(&self) {
        // fails only while the thread's locals are being torn down
        let _ = THREAD_EXIT.try_with(|guard| guard.watch(&self.slots));
    }

    fn check_key(&self, key: &str) -> Result<()> {
        if !is_reserved_key(key) {
            return Ok(());
        }
        let err = Error::ReservedKey {
            key: key.to_owned(),
        };
        let hook = Arc::clone(&*self.error_hook.read());
        hook.report(&err);
        Err(err)
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextStore")
            .field("active_slots", &self.active_slots())
            .field("publish_lifecycle", &self.publish_lifecycle)
            .finish()
    }
}

thread_local! {
    static THREAD_EXIT: ThreadExitGuard = ThreadExitGuard {
        thread: current_thread(),
        stores: RefCell::new(Vec::new()),
    };
}

/// Removes its thread's entries from every store it watches when dropped
struct ThreadExitGuard {
    thread: ThreadId,
    stores: RefCell<Vec<Weak<SlotMap>>>,
}

impl ThreadExitGuard {
    fn watch(&self, slots: &Arc<SlotMap>) {
        let mut stores = self.stores.borrow_mut();
        stores.retain(|store| store.strong_count() > 0);
        if !stores.iter().any(|store| store.as_ptr() == Arc::as_ptr(slots)) {
            stores.push(Arc::downgrade(slots));
        }
    }
}

impl Drop for ThreadExitGuard {
    fn drop(&mut self) {
        for slots in self.stores.get_mut().drain(..).filter_map(|store| store.upgrade()) {
            if slots.remove(&self.thread).is_some() {
                trace!(thread = ?self.thread, "Released slot of exited thread");
            }
        }
    }
}

#[inline]
fn current_thread() -> ThreadId {
    thread::current().id()
}

fn missing(key: &str) -> Error {
    Error::MissingKey {
        key: key.to_owned(),
    }
}
