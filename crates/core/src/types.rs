//! Core identifier types
//!
//! - [`TransactionId`]: opaque identifier of a logical activity
//! - [`UNINITIALIZED_TRANSACTION_ID`]: sentinel meaning "no active transaction"

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel identifier reported by threads with no transaction context
pub const UNINITIALIZED_TRANSACTION_ID: &str = "strand_null_id";

/// Opaque identifier of a transaction
///
/// Values produced by [`crate::id::generate_transaction_id`] are 24 lowercase
/// hex characters, but callers with their own identifier scheme may set any
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap an existing identifier string
    pub fn new(id: impl Into<String>) -> Self {
        TransactionId(id.into())
    }

    /// The "no active transaction" sentinel
    pub fn uninitialized() -> Self {
        TransactionId(UNINITIALIZED_TRANSACTION_ID.to_owned())
    }

    /// Check whether this is the sentinel value
    pub fn is_uninitialized(&self) -> bool {
        self.0 == UNINITIALIZED_TRANSACTION_ID
    }

    /// Borrow the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the identifier text
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::uninitialized()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        TransactionId(s)
    }
}

impl From<&str> for TransactionId {
    fn from(s: &str) -> Self {
        TransactionId(s.to_owned())
    }
}

impl PartialEq<str> for TransactionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TransactionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
