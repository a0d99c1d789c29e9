//! Transaction identifier generation
//!
//! Identifiers are 96 random bits from the thread-local RNG, hex-encoded.
//! Collisions are possible in principle; the generator is fast, not
//! cryptographically strong, and must never be used to mint secrets.

use crate::types::TransactionId;
use rand::RngCore;

/// Length of a generated identifier in characters
pub const TRANSACTION_ID_LENGTH: usize = 24;

/// Produce a fresh random transaction identifier
pub fn generate_transaction_id() -> TransactionId {
    let mut bytes = [0u8; TRANSACTION_ID_LENGTH / 2];
    rand::thread_rng().fill_bytes(&mut bytes);
    TransactionId::new(hex::encode(bytes))
}
