//! Runtime configuration
//!
//! Configuration is a plain serde-deserializable struct so hosts can embed it
//! in their own config files; [`StrandConfig::from_env`] covers the common
//! environment-variable overrides.

use serde::{Deserialize, Serialize};

/// Tag marking metadata that travels in the propagation header
pub const PROPAGATE_TAG: &str = "PROPAGATE_IN_REQUEST";

const ENV_PUBLISH_LIFECYCLE: &str = "STRAND_PUBLISH_LIFECYCLE_EVENTS";
const ENV_RETAG_UNPACKED: &str = "STRAND_RETAG_UNPACKED";

/// Configuration shared by the context store, decorators and codec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrandConfig {
    /// Publish transaction begin/end and thread enter/exit events
    pub publish_lifecycle_events: bool,
    /// Tag unpacked metadata for propagation again (multi-hop forwarding)
    pub retag_unpacked: bool,
    /// Tag that selects metadata for the propagation header
    pub propagate_tag: String,
    /// Expected number of concurrently active threads
    pub initial_capacity: usize,
}

impl Default for StrandConfig {
    fn default() -> Self {
        Self {
            publish_lifecycle_events: true,
            retag_unpacked: false,
            propagate_tag: PROPAGATE_TAG.to_owned(),
            initial_capacity: 64,
        }
    }
}

impl StrandConfig {
    /// Defaults, overridden by `STRAND_*` environment variables when present
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_flag(ENV_PUBLISH_LIFECYCLE) {
            config.publish_lifecycle_events = v;
        }
        if let Some(v) = env_flag(ENV_RETAG_UNPACKED) {
            config.retag_unpacked = v;
        }
        config
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    parse_flag(&raw)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
