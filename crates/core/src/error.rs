//! Error taxonomy shared by every Strand crate
//!
//! None of these errors are fatal to the host process. They are returned to
//! the caller that misused an API (reserved keys, missing keys) or reported
//! through logging and counters where the failing party is not the caller
//! (listener failures, undecodable header segments).

use thiserror::Error;

/// All Strand core errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Metadata key uses the prefix reserved for internal bookkeeping
    #[error("metadata key '{key}' uses the reserved prefix and may not be used")]
    ReservedKey {
        /// The rejected key
        key: String,
    },

    /// A tag operation named a key with no metadata entry
    #[error("no metadata entry exists for key '{key}'")]
    MissingKey {
        /// The absent key
        key: String,
    },

    /// A propagated header segment could not be decoded
    #[error("could not decode segment '{segment}': {reason}")]
    Decode {
        /// The raw segment as received
        segment: String,
        /// Why decoding failed
        reason: String,
    },

    /// A listener panicked while handling an event
    #[error("listener at priority {priority} failed: {message}")]
    ListenerFailure {
        /// Priority group of the failing listener
        priority: i32,
        /// Panic payload, when it was a string
        message: String,
    },
}

/// Result type for Strand core operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a reserved-key misuse
    pub fn is_reserved_key(&self) -> bool {
        matches!(self, Error::ReservedKey { .. })
    }

    /// Check if this is a missing-key error
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Error::MissingKey { .. })
    }
}
