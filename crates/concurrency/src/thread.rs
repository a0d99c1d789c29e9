//! Decorated thread bodies
//!
//! [`ThreadBody`] is captured on the spawning thread and entered as the first
//! thing the new thread does, so the whole body runs inside the spawner's
//! context. The context is released when the body returns or unwinds.

use crate::decoration::Decoration;
use crate::propagator::Propagator;
use std::io;
use std::thread::{Builder, JoinHandle};
use tracing::debug;

/// Body of a thread, carrying the spawning thread's context
pub struct ThreadBody<F> {
    decoration: Decoration,
    body: F,
}

impl<F, T> ThreadBody<F>
where
    F: FnOnce() -> T,
{
    /// Capture the calling thread's context for `body`
    pub fn new(propagator: &Propagator, body: F) -> Self {
        Self {
            decoration: propagator.capture(),
            body,
        }
    }

    /// The captured context
    pub fn decoration(&self) -> &Decoration {
        &self.decoration
    }

    /// Execute on the current thread with the captured context bound
    pub fn run(self) -> T {
        let Self { decoration, body } = self;
        let _scope = decoration.enter();
        body()
    }
}

/// Spawn a thread whose body runs in the calling thread's context
pub fn spawn<F, T>(propagator: &Propagator, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    spawn_with(propagator, Builder::new(), f)
}

/// Like [`spawn`], with a caller-configured [`Builder`]
pub fn spawn_with<F, T>(propagator: &Propagator, builder: Builder, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let body = ThreadBody::new(propagator, f);
    debug!(transaction_id = %body.decoration().transaction_id(), "Spawning decorated thread");
    builder.spawn(move || body.run())
}
