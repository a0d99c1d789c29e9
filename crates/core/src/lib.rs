//! Core types for Strand
//!
//! This crate defines the vocabulary shared by every other crate:
//! - [`TransactionId`] and the identifier generator
//! - [`Value`], the payload type of metadata and events
//! - [`Error`], the error taxonomy
//! - [`StrandConfig`], runtime configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod id;
pub mod types;
pub mod value;

pub use config::{StrandConfig, PROPAGATE_TAG};
pub use error::{Error, Result};
pub use id::{generate_transaction_id, TRANSACTION_ID_LENGTH};
pub use types::{TransactionId, UNINITIALIZED_TRANSACTION_ID};
pub use value::Value;

/// Prefix reserved for internal metadata keys
pub const RESERVED_KEY_PREFIX: &str = "$strand.";

/// Check whether a metadata key falls under [`RESERVED_KEY_PREFIX`]
#[inline]
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with(RESERVED_KEY_PREFIX)
}
