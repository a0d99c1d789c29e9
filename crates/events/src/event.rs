//! Event types
//!
//! An [`Event`] is an origin tag, a kind and an immutable data bag. Protocol
//! specific payloads (HTTP requests, downstream calls) are expressed by
//! collaborators as [`EventKind::Custom`] events with keyed data.

use std::collections::HashMap;
use std::thread::ThreadId;
use strand_core::Value;

/// Origin tag of events raised by the context store
pub const ORIGIN_CORE: &str = "Core";

/// Origin tag of events raised by the concurrency decorators
pub const ORIGIN_CONCURRENCY: &str = "Concurrency";

/// What happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A fresh transaction context was created on a thread
    TransactionBegin,
    /// A transaction context was torn down
    TransactionEnd,
    /// A handed-off unit of work bound its originating context
    ThreadEnter {
        /// Thread that captured the context
        parent: ThreadId,
        /// Thread now executing with it
        child: ThreadId,
    },
    /// A handed-off unit of work released its originating context
    ThreadExit {
        /// Thread that captured the context
        parent: ThreadId,
        /// Thread that executed with it
        child: ThreadId,
    },
    /// Collaborator-defined event, named by the collaborator
    Custom(String),
}

impl EventKind {
    /// Short name for logs
    pub fn name(&self) -> &str {
        match self {
            EventKind::TransactionBegin => "TransactionBegin",
            EventKind::TransactionEnd => "TransactionEnd",
            EventKind::ThreadEnter { .. } => "ThreadEnter",
            EventKind::ThreadExit { .. } => "ThreadExit",
            EventKind::Custom(name) => name,
        }
    }
}

/// A published event
///
/// Built with [`Event::new`] and [`Event::with_data`]; there is no way to
/// mutate an event once it has been built.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    origin: String,
    kind: EventKind,
    data: HashMap<String, Value>,
}

impl Event {
    /// Create an event with an empty data bag
    pub fn new(origin: impl Into<String>, kind: EventKind) -> Self {
        Self {
            origin: origin.into(),
            kind,
            data: HashMap::new(),
        }
    }

    /// Create a collaborator-defined event
    pub fn custom(origin: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(origin, EventKind::Custom(name.into()))
    }

    /// Attach a data entry (builder style)
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Subsystem that raised the event
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Event kind
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Look up a data entry
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// The whole data bag
    pub fn data(&self) -> &HashMap<String, Value> {
        &self.data
    }
}
