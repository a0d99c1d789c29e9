//! Capture and re-binding of a thread's transaction context
//!
//! A [`Decoration`] is taken on the thread that hands work off. It records that
//! thread's id and an `Arc` to its [`ContextSlot`], so metadata written on
//! either side while the work is in flight is visible to both.
//!
//! [`Decoration::enter`] is the before-step and returns a [`DecorationScope`]
//! whose `Drop` is the after-step. Because the after-step lives in `Drop` it
//! also runs when the wrapped work panics.
//!
//! # Binding rules
//!
//! | executing thread state                 | before-step      |
//! |----------------------------------------|------------------|
//! | captured slot uninitialized            | no-op            |
//! | same slot already bound                | no-op            |
//! | different initialized slot bound       | no-op (reentry)  |
//! | nothing bound, or a stale slot         | bind + ThreadEnter |
//!
//! The executing thread's id plays no part: a pooled worker that captured
//! while borrowing a context may run the work after that binding is gone.
//! Synchronous dispatch on the capturing thread hits the same-slot row.
//!
//! The after-step only undoes a binding this scope made, and only while that
//! binding is still in place.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use strand_context::{ContextSlot, ContextStore};
use strand_core::TransactionId;
use strand_events::{Event, EventKind, ORIGIN_CONCURRENCY};
use tracing::trace;

/// Context captured from the thread that handed off a unit of work
#[derive(Clone)]
pub struct Decoration {
    store: Arc<ContextStore>,
    origin: ThreadId,
    slot: Option<Arc<ContextSlot>>,
}

impl Decoration {
    /// Capture the calling thread's context
    pub fn capture(store: &Arc<ContextStore>) -> Self {
        Self {
            store: Arc::clone(store),
            origin: thread::current().id(),
            slot: store.current_slot(),
        }
    }

    /// Thread that performed the capture
    pub fn origin(&self) -> ThreadId {
        self.origin
    }

    /// Transaction identifier of the captured slot, read now
    pub fn transaction_id(&self) -> TransactionId {
        self.slot
            .as_ref()
            .map(|slot| slot.transaction_id())
            .unwrap_or_default()
    }

    /// Run the before-step on the calling thread
    ///
    /// Keep the returned scope alive for as long as the wrapped work runs.
    #[must_use = "dropping the scope immediately unbinds the context"]
    pub fn enter(&self) -> DecorationScope<'_> {
        let inert = DecorationScope {
            decoration: self,
            previous: None,
            bound: false,
        };

        let Some(slot) = self.slot.as_ref() else {
            return inert;
        };
        if !slot.is_initialized() {
            return inert;
        }
        let current = thread::current().id();

        if let Some(bound) = self.store.current_slot() {
            if Arc::ptr_eq(&bound, slot) {
                return inert;
            }
            if bound.is_initialized() {
                trace!(
                    parent = ?self.origin,
                    child = ?current,
                    "Thread already carries a transaction context; leaving it in place"
                );
                return inert;
            }
        }

        let previous = self.store.bind(Arc::clone(slot));
        self.store.publish_lifecycle(Event::new(
            ORIGIN_CONCURRENCY,
            EventKind::ThreadEnter {
                parent: self.origin,
                child: current,
            },
        ));

        DecorationScope {
            decoration: self,
            previous,
            bound: true,
        }
    }
}

impl fmt::Debug for Decoration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoration")
            .field("origin", &self.origin)
            .field("transaction_id", &self.transaction_id())
            .finish()
    }
}

/// Guard whose drop is the after-step of a [`Decoration`]
pub struct DecorationScope<'a> {
    decoration: &'a Decoration,
    previous: Option<Arc<ContextSlot>>,
    bound: bool,
}

impl DecorationScope<'_> {
    /// Whether the before-step bound the captured context
    pub fn is_bound(&self) -> bool {
        self.bound
    }
}

impl Drop for DecorationScope<'_> {
    fn drop(&mut self) {
        if !self.bound {
            return;
        }
        let Some(slot) = self.decoration.slot.as_ref() else {
            return;
        };
        let store = &self.decoration.store;
        let still_ours = store
            .current_slot()
            .map_or(false, |bound| Arc::ptr_eq(&bound, slot));
        if !still_ours {
            return;
        }

        store.publish_lifecycle(Event::new(
            ORIGIN_CONCURRENCY,
            EventKind::ThreadExit {
                parent: self.decoration.origin,
                child: thread::current().id(),
            },
        ));
        store.unbind_if(slot, self.previous.take());
    }
}
