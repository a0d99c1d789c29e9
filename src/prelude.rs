//! Convenient imports for Strand.
//!
//! ```ignore
//! use strand::prelude::*;
//!
//! let strand = Strand::new();
//! strand.transaction(|| strand.put_metadata("key", "value"))?;
//! ```

// Main entry point
pub use crate::runtime::{global, Strand, StrandBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Context and hand-off
pub use strand_concurrency::{Decorate, Propagator, Subtask};
pub use strand_context::ContextStore;
pub use strand_core::{TransactionId, Value};

// Events
pub use strand_events::{listener_fn, Event, EventBus, EventKind, Listener};
