//! Unified error type for Strand.
//!
//! Wraps the errors raised by the individual crates and presents one
//! consistent interface to hosts.

use thiserror::Error;

/// All Strand errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Metadata key falls under the reserved prefix
    #[error("reserved metadata key: {0}")]
    ReservedKey(String),

    /// Metadata key (or the context holding it) does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Propagated header segment could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// A listener panicked while handling an event
    #[error("listener failure: {0}")]
    Listener(String),

    /// Spawning a decorated thread failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Strand operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a reserved-key error.
    pub fn is_reserved_key(&self) -> bool {
        matches!(self, Error::ReservedKey(_))
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is a decode error.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_))
    }
}

// Convert from internal core errors
impl From<strand_core::Error> for Error {
    fn from(e: strand_core::Error) -> Self {
        use strand_core::Error as CoreError;
        match e {
            CoreError::ReservedKey { key } => Error::ReservedKey(key),
            CoreError::MissingKey { key } => Error::NotFound(format!("metadata key '{}'", key)),
            CoreError::Decode { segment, reason } => {
                Error::Decode(format!("segment '{}': {}", segment, reason))
            }
            CoreError::ListenerFailure { priority, message } => {
                Error::Listener(format!("priority {}: {}", priority, message))
            }
        }
    }
}
