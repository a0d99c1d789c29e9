//! Executors that decorate every submission

use crate::propagator::Propagator;
use crate::task::{Decorate, DecoratedRepeating, Runnable};
use rayon::ThreadPool;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

/// Something that runs [`Runnable`]s, possibly on other threads
pub trait Executor: Send + Sync {
    /// Schedule `task`
    fn execute(&self, task: Runnable);
}

impl Executor for ThreadPool {
    fn execute(&self, task: Runnable) {
        self.spawn(task);
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, task: Runnable) {
        (**self).execute(task)
    }
}

/// Wraps an [`Executor`] so every submitted task runs in its submitter's context
#[derive(Debug)]
pub struct DecoratingExecutor<E> {
    inner: E,
    propagator: Propagator,
}

impl<E: Executor> DecoratingExecutor<E> {
    /// Decorate submissions to `inner`
    pub fn new(inner: E, propagator: Propagator) -> Self {
        Self { inner, propagator }
    }

    /// The wrapped executor
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Submit a value-returning task; the result arrives on the receiver
    ///
    /// If the task panics the sender is dropped and `recv` returns an error.
    pub fn submit<F, T>(&self, f: F) -> Receiver<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let task = self.propagator.callable(f);
        self.inner.execute(Box::new(move || {
            // receiver may be gone; the result is simply discarded
            let _ = tx.send(task.call());
        }));
        rx
    }

    /// Submit one run of a repeatable task
    ///
    /// The run carries a new capture from the calling thread unless `task` is
    /// memoized. Periodic drivers call this once per period.
    pub fn execute_repeating<F>(&self, task: &DecoratedRepeating<F>)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let run = task.resubmit(&self.propagator);
        self.inner.execute(Box::new(move || run.run()));
    }
}

impl<E: Executor> Executor for DecoratingExecutor<E> {
    fn execute(&self, task: Runnable) {
        let task = task.decorate(&self.propagator);
        self.inner.execute(task.into_runnable());
    }
}
