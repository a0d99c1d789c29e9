//! Transaction context for Strand
//!
//! This crate implements the per-thread, request-scoped context:
//! - [`ContextStore`]: create/destroy lifecycle, identifier and metadata access
//! - [`ContextSlot`]: the state bound to a thread, shared by `Arc`
//! - [`MetadataMap`]: concurrent tagged key/value storage
//! - [`ErrorHook`]: where reserved-key misuse is reported

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod hook;
pub mod metadata;
pub mod slot;
pub mod store;

pub use hook::{ErrorHook, FnHook, LoggingHook};
pub use metadata::{MetadataItem, MetadataMap};
pub use slot::ContextSlot;
pub use store::ContextStore;
