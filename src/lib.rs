//! # Strand
//!
//! Thread-spanning transaction context and an in-process event bus.
//!
//! Strand keeps a request-scoped ("transactional") context per thread and
//! carries it across thread hand-offs, and fans structured events out to
//! observers in priority order.
//!
//! ## Quick Start
//!
//! ```ignore
//! use strand::prelude::*;
//!
//! let strand = Strand::new();
//!
//! strand.begin();
//! strand.put_metadata("user", "alice")?;
//! strand.propagate("user")?;
//!
//! // Work handed to another thread sees the same context
//! let task = strand.propagator().runnable(|| {
//!     let user = strand::global().get_metadata("user");
//! });
//! std::thread::spawn(move || task.run());
//!
//! // Outbound header for a downstream call
//! let header = strand.pack();
//!
//! strand.end();
//! ```
//!
//! ## Building Blocks
//!
//! - [`ContextStore`] - per-thread transaction context
//! - [`Propagator`] - decorates work handed to other threads
//! - [`EventBus`] - priority-ordered publish/subscribe
//! - [`ContextPropagation`] - packs tagged metadata into a header value

#![warn(missing_docs)]

mod error;
mod runtime;

pub mod prelude;

// Re-export main entry points
pub use error::{Error, Result};
pub use runtime::{global, Strand, StrandBuilder};

// Re-export building blocks
pub use strand_concurrency::{
    fork_join, invoke, Decorate, DecoratedCallable, DecoratedRepeating, DecoratedRunnable,
    DecoratingExecutor, Decoration, DecorationField, Executor, Propagator, Recapture, Runnable,
    Subtask, ThreadBody,
};
pub use strand_context::{ContextSlot, ContextStore, ErrorHook, FnHook, LoggingHook};
pub use strand_core::{
    generate_transaction_id, StrandConfig, TransactionId, Value, PROPAGATE_TAG,
    RESERVED_KEY_PREFIX, UNINITIALIZED_TRANSACTION_ID,
};
pub use strand_events::{
    listener_fn, Event, EventBus, EventKind, Listener, ORIGIN_CONCURRENCY, ORIGIN_CORE,
};
pub use strand_propagation::{ContextPropagation, PROPAGATION_HEADER};
