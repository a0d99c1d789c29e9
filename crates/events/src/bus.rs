//! Event bus
//!
//! Publish/subscribe registry with priority-ordered, synchronous delivery.
//!
//! # Design
//!
//! - Registry: `BTreeMap<priority, Vec<listener>>` behind an `Arc`
//! - Copy-on-write: mutations clone the map only while a publish still holds
//!   the previous snapshot (`Arc::make_mut`)
//! - Publish takes the read lock just long enough to clone the `Arc`, then
//!   delivers with no lock held
//!
//! # Thread Safety
//!
//! `publish`, `add_listener` and `remove_listener` may be called from any
//! thread at any time, including from inside a listener. A listener added or
//! removed during a publish takes effect from the next publish.

use crate::event::Event;
use crate::listener::{same_listener, Listener};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strand_core::Error;
use tracing::{debug, error};

type Registry = BTreeMap<i32, Vec<Arc<dyn Listener>>>;

/// Priority-ordered publish/subscribe registry
pub struct EventBus {
    /// Current registry snapshot
    listeners: RwLock<Arc<Registry>>,

    /// Total events published
    events_published: AtomicU64,

    /// Total listener invocations that panicked
    listener_failures: AtomicU64,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Arc::new(Registry::new())),
            events_published: AtomicU64::new(0),
            listener_failures: AtomicU64::new(0),
        }
    }

    /// Register a listener under its declared priority
    ///
    /// Registering the same listener (by identity) twice at the same priority
    /// is a no-op.
    pub fn add_listener(&self, listener: Arc<dyn Listener>) {
        let priority = listener.priority();
        let mut guard = self.listeners.write();
        let group = Arc::make_mut(&mut *guard).entry(priority).or_default();
        if group.iter().any(|l| same_listener(l, &listener)) {
            return;
        }
        group.push(listener);
        debug!(priority, "Listener added");
    }

    /// Unregister a listener; removing an absent listener is a no-op
    pub fn remove_listener(&self, listener: &Arc<dyn Listener>) {
        let priority = listener.priority();
        let mut guard = self.listeners.write();
        let present = guard
            .get(&priority)
            .map_or(false, |group| group.iter().any(|l| same_listener(l, listener)));
        if !present {
            return;
        }

        let registry = Arc::make_mut(&mut *guard);
        if let Some(group) = registry.get_mut(&priority) {
            group.retain(|l| !same_listener(l, listener));
            if group.is_empty() {
                registry.remove(&priority);
            }
        }
        debug!(priority, "Listener removed");
    }

    /// Drop every registration, returning the bus to its initial state
    pub fn remove_all_listeners(&self) {
        *self.listeners.write() = Arc::new(Registry::new());
    }

    /// Check whether a listener is registered in its declared priority group
    pub fn is_listener_present(&self, listener: &Arc<dyn Listener>) -> bool {
        self.listeners
            .read()
            .get(&listener.priority())
            .map_or(false, |group| group.iter().any(|l| same_listener(l, listener)))
    }

    /// Number of registered listeners across all priorities
    pub fn listener_count(&self) -> usize {
        self.listeners.read().values().map(Vec::len).sum()
    }

    /// Deliver an event to every listener, lowest priority value first
    ///
    /// A panicking listener is logged and skipped; delivery continues with the
    /// rest. Returns the number of listeners that handled the event without
    /// panicking.
    pub fn publish(&self, event: &Event) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        let snapshot = Arc::clone(&*self.listeners.read());

        debug!(
            origin = event.origin(),
            kind = event.kind().name(),
            "Publishing event"
        );

        let mut delivered = 0;
        for (priority, group) in snapshot.iter() {
            for listener in group {
                match panic::catch_unwind(AssertUnwindSafe(|| listener.listen(event))) {
                    Ok(()) => delivered += 1,
                    Err(payload) => {
                        self.listener_failures.fetch_add(1, Ordering::Relaxed);
                        let failure = Error::ListenerFailure {
                            priority: *priority,
                            message: panic_message(payload.as_ref()),
                        };
                        error!(
                            origin = event.origin(),
                            kind = event.kind().name(),
                            error = %failure,
                            "Listener failed, continuing delivery"
                        );
                    }
                }
            }
        }
        delivered
    }

    /// Total events published
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    /// Total listener invocations that panicked
    pub fn listener_failures(&self) -> u64 {
        self.listener_failures.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .field("events_published", &self.events_published())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
