//! Cross-Thread Propagation Test Suite
//!
//! Verifies that transaction context follows work across thread hand-offs:
//!
//! 1. Decorated tasks observe the originating thread's metadata
//! 2. Executing threads are left clean (or as they were) afterwards
//! 3. Reentrant hand-offs never disturb an outer context
//! 4. Thread enter/exit events bracket every binding
//! 5. Fork/join subtasks and executors carry the context
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test cross_thread
//! cargo test --test cross_thread reentrancy::
//! ```

use parking_lot::Mutex;
use std::sync::Arc;
use strand::{listener_fn, EventKind, Strand};

// Test modules
pub mod events;
pub mod executor;
pub mod fork_join;
pub mod handoff;
pub mod reentrancy;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Fresh instance with lifecycle events on
pub fn create_strand() -> Strand {
    Strand::new()
}

/// Recorded event kinds, in delivery order
pub type EventLog = Arc<Mutex<Vec<EventKind>>>;

/// Instance plus a log of every event it publishes
pub fn create_recording_strand() -> (Strand, EventLog) {
    let strand = create_strand();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    strand.add_listener(listener_fn(0, move |e| sink.lock().push(e.kind().clone())));
    (strand, log)
}

/// Small dedicated rayon pool
pub fn create_pool(threads: usize) -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("strand-test-{}", i))
        .build()
        .expect("Failed to build thread pool")
}
