//! Entry point for decorating work handed to other threads

use crate::decoration::Decoration;
use crate::task::{Decorate, DecoratedCallable, DecoratedRepeating, DecoratedRunnable};
use std::sync::Arc;
use strand_context::ContextStore;

/// Decorates units of work against a [`ContextStore`]
///
/// Cheap to clone; every clone shares the same store.
#[derive(Debug, Clone)]
pub struct Propagator {
    store: Arc<ContextStore>,
}

impl Propagator {
    /// Create a propagator over `store`
    pub fn new(store: Arc<ContextStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<ContextStore> {
        &self.store
    }

    /// Capture the calling thread's context
    pub fn capture(&self) -> Decoration {
        Decoration::capture(&self.store)
    }

    /// Decorate any supported unit of work
    pub fn decorate<D: Decorate>(&self, unit: D) -> D::Output {
        unit.decorate(self)
    }

    /// Decorate a closure as a fire-and-forget task
    pub fn runnable<F>(&self, f: F) -> DecoratedRunnable
    where
        F: FnOnce() + Send + 'static,
    {
        DecoratedRunnable::new(self.capture(), Box::new(f))
    }

    /// Decorate a closure as a value-returning task
    pub fn callable<F, T>(&self, f: F) -> DecoratedCallable<T>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        DecoratedCallable::new(self.capture(), Box::new(f))
    }

    /// Decorate a closure that may run many times
    ///
    /// Resubmissions recapture by default; see [`DecoratedRepeating::memoized`].
    pub fn repeating<F>(&self, f: F) -> DecoratedRepeating<F>
    where
        F: Fn() + Send + Sync,
    {
        DecoratedRepeating::new(self.capture(), f)
    }

    /// Run two closures in parallel on the rayon pool, each inside the
    /// calling thread's context
    ///
    /// Whichever closure rayon runs on the calling thread sees the context
    /// directly; the other binds it for its duration.
    ///
    /// A worker blocked in a join may steal jobs belonging to another
    /// transaction. Such a job finds this context already bound and runs
    /// under it, so a pool shared between transactions gives no isolation
    /// for work spawned from inside a join. Give each transaction its own
    /// pool when that matters.
    pub fn join<A, B, RA, RB>(&self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        let left = self.capture();
        let right = left.clone();
        rayon::join(
            move || {
                let _scope = left.enter();
                a()
            },
            move || {
                let _scope = right.enter();
                b()
            },
        )
    }
}
