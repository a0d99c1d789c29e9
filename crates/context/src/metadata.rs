//! Concurrent tagged metadata map
//!
//! A [`MetadataMap`] is shared between the thread that owns a transaction
//! context and every thread that a decorated unit of work is handed to, so it
//! must tolerate concurrent readers and writers without external locking.
//!
//! # Design
//!
//! - DashMap: sharded, only the target key's shard is locked on write
//! - Tags: small FxHashSet per entry
//! - Reads return clones; no guard ever escapes this module

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::FxHashSet;
use std::collections::HashMap;
use strand_core::Value;

/// One metadata entry: a value plus the tags attached to its key
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataItem {
    value: Value,
    tags: FxHashSet<String>,
}

impl MetadataItem {
    /// Create an untagged entry
    pub fn new(value: Value) -> Self {
        Self {
            value,
            tags: FxHashSet::default(),
        }
    }

    /// The stored value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Check whether `tag` is attached
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Attach `tag`; attaching twice is harmless
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    /// Detach `tag`
    pub fn clear_tag(&mut self, tag: &str) {
        self.tags.remove(tag);
    }
}

/// Concurrent key → [`MetadataItem`] map
#[derive(Debug, Default)]
pub struct MetadataMap {
    entries: DashMap<String, MetadataItem>,
}

impl MetadataMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, keeping any tags already attached to the key
    ///
    /// Returns the previous value.
    pub fn put(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        match self.entries.entry(key.into()) {
            Entry::Occupied(mut entry) => Some(std::mem::replace(&mut entry.get_mut().value, value)),
            Entry::Vacant(entry) => {
                entry.insert(MetadataItem::new(value));
                None
            }
        }
    }

    /// Read a value
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|item| item.value.clone())
    }

    /// Remove an entry together with its tags
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.remove(key).map(|(_, item)| item.value)
    }

    /// Check whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Attach a tag to an existing key; returns `false` if the key is absent
    pub fn set_tag(&self, key: &str, tag: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(mut item) => {
                item.set_tag(tag);
                true
            }
            None => false,
        }
    }

    /// Detach a tag from an existing key; returns `false` if the key is absent
    pub fn clear_tag(&self, key: &str, tag: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(mut item) => {
                item.clear_tag(tag);
                true
            }
            None => false,
        }
    }

    /// Whether `key` carries `tag`, or `None` if the key is absent
    pub fn has_tag(&self, key: &str, tag: &str) -> Option<bool> {
        self.entries.get(key).map(|item| item.has_tag(tag))
    }

    /// Snapshot of every key/value pair carrying `tag`
    pub fn with_tag(&self, tag: &str) -> HashMap<String, Value> {
        self.entries
            .iter()
            .filter(|entry| entry.value().has_tag(tag))
            .map(|entry| (entry.key().clone(), entry.value().value.clone()))
            .collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.clear();
    }
}
