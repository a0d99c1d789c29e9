//! Listener contract

use crate::event::Event;
use std::fmt;
use std::sync::Arc;

/// Receives events published on an [`crate::EventBus`]
///
/// Listeners run synchronously on the publishing thread, so a slow listener
/// stalls the code path that published. A panicking listener is isolated by
/// the bus and does not affect other listeners.
pub trait Listener: Send + Sync {
    /// Delivery priority; lower values are delivered first
    fn priority(&self) -> i32 {
        0
    }

    /// Handle one event
    fn listen(&self, event: &Event);
}

/// Adapter turning a closure into a [`Listener`]
pub struct FnListener<F> {
    priority: i32,
    handler: F,
}

impl<F> FnListener<F>
where
    F: Fn(&Event) + Send + Sync,
{
    /// Wrap `handler` at the given priority
    pub fn new(priority: i32, handler: F) -> Self {
        Self { priority, handler }
    }
}

impl<F> Listener for FnListener<F>
where
    F: Fn(&Event) + Send + Sync,
{
    fn priority(&self) -> i32 {
        self.priority
    }

    fn listen(&self, event: &Event) {
        (self.handler)(event)
    }
}

impl<F> fmt::Debug for FnListener<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnListener")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Build a shareable closure listener
///
/// Keep the returned `Arc` to remove the listener later; identity is what the
/// bus uses for deduplication and removal.
pub fn listener_fn<F>(priority: i32, handler: F) -> Arc<FnListener<F>>
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    Arc::new(FnListener::new(priority, handler))
}

/// Identity comparison of two listener handles, ignoring vtables
#[inline]
pub(crate) fn same_listener(a: &Arc<dyn Listener>, b: &Arc<dyn Listener>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
