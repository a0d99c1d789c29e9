//! Event bus for Strand
//!
//! Observers register a [`Listener`] with an integer priority; publishers hand
//! an [`Event`] to [`EventBus::publish`], which delivers it synchronously to
//! every listener in ascending priority order.
//!
//! ```text
//! interceptor ── publish(e) ──▶ EventBus ──▶ priority -10 listeners
//!                                        ──▶ priority   0 listeners
//!                                        ──▶ priority  10 listeners
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod event;
pub mod listener;

pub use bus::EventBus;
pub use event::{Event, EventKind, ORIGIN_CONCURRENCY, ORIGIN_CORE};
pub use listener::{listener_fn, FnListener, Listener};
