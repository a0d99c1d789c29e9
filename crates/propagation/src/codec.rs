//! Packed header codec
//!
//! Wire format: `key=value` pairs joined by `&`, both halves percent-encoded
//! with every non-alphanumeric byte escaped.
//!
//! ```text
//! role=admin%20%26%20ops&tenant=acme%2Dcorp
//! ```
//!
//! Decoding also accepts `+` for a space, as emitted by form encoders.

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use strand_context::ContextStore;
use strand_core::{Error, StrandConfig, Value};
use tracing::{debug, warn};

/// Header carrying packed metadata between processes
pub const PROPAGATION_HEADER: &str = "x-strand-ctxt-prop-data";

const PAIR_DELIMITER: char = '&';
const KEY_DELIMITER: char = '=';

/// Moves propagate-tagged metadata in and out of a single header value
#[derive(Debug, Clone)]
pub struct ContextPropagation {
    store: Arc<ContextStore>,
    tag: String,
    retag_unpacked: bool,
}

impl ContextPropagation {
    /// Codec over `store` using the default configuration
    pub fn new(store: Arc<ContextStore>) -> Self {
        Self::with_config(store, &StrandConfig::default())
    }

    /// Codec over `store` using `config`'s tag and retag setting
    pub fn with_config(store: Arc<ContextStore>, config: &StrandConfig) -> Self {
        Self {
            store,
            tag: config.propagate_tag.clone(),
            retag_unpacked: config.retag_unpacked,
        }
    }

    /// Tag that selects metadata for propagation
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Pack every propagate-tagged entry
    pub fn pack_all(&self) -> Option<String> {
        self.pack(&HashSet::new())
    }

    /// Pack propagate-tagged entries whose keys are not in `exclude`
    ///
    /// Returns `None` rather than an empty string when nothing qualifies.
    /// Keys are emitted in sorted order.
    pub fn pack(&self, exclude: &HashSet<String>) -> Option<String> {
        let mut entries: Vec<(String, Value)> = self
            .store
            .get_metadata_with_tag(&self.tag)
            .into_iter()
            .filter(|(key, _)| !exclude.contains(key))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut packed = String::new();
        for (key, value) in &entries {
            let Some(text) = value.as_wire_text() else {
                debug!(key = %key, kind = value.type_name(), "Skipping non-scalar metadata");
                continue;
            };
            if !packed.is_empty() {
                packed.push(PAIR_DELIMITER);
            }
            packed.extend(utf8_percent_encode(key, NON_ALPHANUMERIC));
            packed.push(KEY_DELIMITER);
            packed.extend(utf8_percent_encode(&text, NON_ALPHANUMERIC));
        }

        if packed.is_empty() {
            None
        } else {
            Some(packed)
        }
    }

    /// Store every decodable pair of `header` as metadata
    ///
    /// Segments that fail to decode are logged and skipped. Returns the number
    /// of entries stored.
    pub fn unpack(&self, header: &str) -> usize {
        if header.is_empty() {
            return 0;
        }

        let mut stored = 0;
        for segment in header.split(PAIR_DELIMITER).filter(|s| !s.is_empty()) {
            let (key, value) = match decode_pair(segment) {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(error = %err, "Dropping propagated metadata segment");
                    continue;
                }
            };
            // reserved keys are reported by the store's error hook
            if self.store.put_metadata(&key, value).is_err() {
                continue;
            }
            if self.retag_unpacked {
                // the key was just written, so tagging cannot miss
                let _ = self.store.set_metadata_tag(&key, &self.tag);
            }
            stored += 1;
        }
        stored
    }

    /// Propagate-tagged entries restricted to `keys`
    pub fn get_whitelisted(&self, keys: &HashSet<String>) -> HashMap<String, Value> {
        let mut tagged = self.store.get_metadata_with_tag(&self.tag);
        tagged.retain(|key, _| keys.contains(key));
        tagged
    }
}

fn decode_pair(segment: &str) -> Result<(String, String), Error> {
    let (raw_key, raw_value) = segment
        .split_once(KEY_DELIMITER)
        .ok_or_else(|| decode_error(segment, "missing '='"))?;
    let key = decode_component(segment, raw_key)?;
    if key.is_empty() {
        return Err(decode_error(segment, "empty key"));
    }
    let value = decode_component(segment, raw_value)?;
    Ok((key, value))
}

fn decode_component(segment: &str, raw: &str) -> Result<String, Error> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| decode_error(segment, &e.to_string()))
}

fn decode_error(segment: &str, reason: &str) -> Error {
    Error::Decode {
        segment: segment.to_owned(),
        reason: reason.to_owned(),
    }
}
