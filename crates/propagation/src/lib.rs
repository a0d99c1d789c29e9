//! Cross-process propagation of transaction metadata
//!
//! Metadata tagged with the propagate tag is packed into one header value on
//! the way out of a process and unpacked into the receiving thread's context
//! on the way in. See [`ContextPropagation`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;

pub use codec::{ContextPropagation, PROPAGATION_HEADER};
pub use strand_core::PROPAGATE_TAG;
