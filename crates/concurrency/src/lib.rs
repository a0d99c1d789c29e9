//! Context propagation across thread hand-offs
//!
//! Work handed to another thread is decorated on the handing-off thread and
//! binds that thread's transaction context while it runs:
//! - [`DecoratedRunnable`] / [`DecoratedCallable`]: boxed tasks
//! - [`DecoratedRepeating`]: periodic or retried work, bound on every run
//! - [`Subtask`] with [`DecorationField`]: fork/join work on rayon
//! - [`ThreadBody`] and [`spawn`]: whole thread bodies
//! - [`DecoratingExecutor`]: decorates every submission to an [`Executor`]
//!
//! All shapes share the before/after contract implemented by [`Decoration`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decoration;
pub mod executor;
pub mod propagator;
pub mod subtask;
pub mod task;
pub mod thread;

pub use decoration::{Decoration, DecorationScope};
pub use executor::{DecoratingExecutor, Executor};
pub use propagator::Propagator;
pub use subtask::{fork_join, invoke, DecorationField, Subtask};
pub use task::{
    Decorate, DecoratedCallable, DecoratedRepeating, DecoratedRunnable, Recapture, Runnable,
};
pub use thread::{spawn, spawn_with, ThreadBody};
