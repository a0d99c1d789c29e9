//! Decorated fire-and-forget, value-returning and repeatable tasks

use crate::decoration::Decoration;
use crate::propagator::Propagator;
use std::fmt;
use std::sync::Arc;

/// Boxed fire-and-forget unit of work
pub type Runnable = Box<dyn FnOnce() + Send + 'static>;

/// Work that can be wrapped so it runs inside the handing-off thread's context
///
/// Decorating is idempotent: an already-decorated unit comes back unchanged,
/// keeping its original capture.
pub trait Decorate {
    /// The decorated form
    type Output;

    /// Capture the calling thread's context into the unit
    fn decorate(self, propagator: &Propagator) -> Self::Output;
}

/// A [`Runnable`] carrying its originating context
pub struct DecoratedRunnable {
    decoration: Decoration,
    task: Runnable,
}

impl DecoratedRunnable {
    pub(crate) fn new(decoration: Decoration, task: Runnable) -> Self {
        Self { decoration, task }
    }

    /// The captured context
    pub fn decoration(&self) -> &Decoration {
        &self.decoration
    }

    /// Execute with the captured context bound
    pub fn run(self) {
        let Self { decoration, task } = self;
        let _scope = decoration.enter();
        task();
    }

    /// Erase back into a plain [`Runnable`]
    pub fn into_runnable(self) -> Runnable {
        Box::new(move || self.run())
    }
}

impl fmt::Debug for DecoratedRunnable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratedRunnable")
            .field("decoration", &self.decoration)
            .finish_non_exhaustive()
    }
}

impl Decorate for Runnable {
    type Output = DecoratedRunnable;

    fn decorate(self, propagator: &Propagator) -> DecoratedRunnable {
        DecoratedRunnable::new(propagator.capture(), self)
    }
}

impl Decorate for DecoratedRunnable {
    type Output = Self;

    fn decorate(self, _propagator: &Propagator) -> Self {
        self
    }
}

/// A value-returning task carrying its originating context
pub struct DecoratedCallable<T> {
    decoration: Decoration,
    task: Box<dyn FnOnce() -> T + Send + 'static>,
}

impl<T> DecoratedCallable<T> {
    pub(crate) fn new(decoration: Decoration, task: Box<dyn FnOnce() -> T + Send + 'static>) -> Self {
        Self { decoration, task }
    }

    /// The captured context
    pub fn decoration(&self) -> &Decoration {
        &self.decoration
    }

    /// Execute with the captured context bound and return the result
    pub fn call(self) -> T {
        let Self { decoration, task } = self;
        let _scope = decoration.enter();
        task()
    }
}

impl<T> fmt::Debug for DecoratedCallable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratedCallable")
            .field("decoration", &self.decoration)
            .finish_non_exhaustive()
    }
}

impl<T> Decorate for DecoratedCallable<T> {
    type Output = Self;

    fn decorate(self, _propagator: &Propagator) -> Self {
        self
    }
}

/// Which context a [`DecoratedRepeating`] carries into a resubmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recapture {
    /// Capture again on the resubmitting thread
    #[default]
    Fresh,
    /// Keep the original capture for every run
    Memoized,
}

/// A repeatable task carrying its originating context
///
/// Every [`run`](Self::run) is a separate before/after cycle, so periodic or
/// retried work can run any number of times on any threads. Resubmitting
/// through [`resubmit`](Self::resubmit) takes a new capture unless the task
/// was made [`memoized`](Self::memoized).
pub struct DecoratedRepeating<F> {
    decoration: Decoration,
    recapture: Recapture,
    task: Arc<F>,
}

impl<F> DecoratedRepeating<F>
where
    F: Fn() + Send + Sync,
{
    pub(crate) fn new(decoration: Decoration, task: F) -> Self {
        Self {
            decoration,
            recapture: Recapture::Fresh,
            task: Arc::new(task),
        }
    }

    /// Keep the current capture across resubmissions
    pub fn memoized(mut self) -> Self {
        self.recapture = Recapture::Memoized;
        self
    }

    /// The captured context
    pub fn decoration(&self) -> &Decoration {
        &self.decoration
    }

    /// The resubmission policy
    pub fn recapture(&self) -> Recapture {
        self.recapture
    }

    /// Execute once with the captured context bound
    pub fn run(&self) {
        let _scope = self.decoration.enter();
        (self.task)();
    }

    /// A handle for submitting the same work again from the calling thread
    pub fn resubmit(&self, propagator: &Propagator) -> Self {
        let decoration = match self.recapture {
            Recapture::Fresh => propagator.capture(),
            Recapture::Memoized => self.decoration.clone(),
        };
        Self {
            decoration,
            recapture: self.recapture,
            task: Arc::clone(&self.task),
        }
    }
}

impl<F> fmt::Debug for DecoratedRepeating<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratedRepeating")
            .field("decoration", &self.decoration)
            .field("recapture", &self.recapture)
            .finish_non_exhaustive()
    }
}
