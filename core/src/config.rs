use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grouping::OrientationPolicy;

/// Bounds for `max_cached_queries`.
pub const MIN_CACHED_QUERIES: usize = 1;
pub const MAX_CACHED_QUERIES: usize = 1_000_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot parse service config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
}

/// Settings of a `DirectedPathService`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Which direction of a bidirectional pair stays a direct link.
    /// The other one is split by a virtual node.
    pub orientation: OrientationPolicy,
    /// Keep forbidden sets per (start, target) for reuse by derived queries.
    pub cache_exclusions: bool,
    /// Cache capacity; the cache is cleared when it fills up.
    pub max_cached_queries: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            orientation: OrientationPolicy::FirstSeen,
            cache_exclusions: true,
            max_cached_queries: 1024,
        }
    }
}

impl ServiceConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CACHED_QUERIES..=MAX_CACHED_QUERIES).contains(&self.max_cached_queries) {
            return Err(ConfigError::OutOfRange {
                name: "max_cached_queries",
                value: self.max_cached_queries,
                min: MIN_CACHED_QUERIES,
                max: MAX_CACHED_QUERIES,
            });
        }
        Ok(())
    }
}
