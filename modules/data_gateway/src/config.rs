//! Configuration for the data gateway module

use serde::Deserialize;
use std::time::Duration;

/// Data gateway configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Time-to-live for cached single-record reads
    #[serde(with = "humantime_serde", default = "default_cache_ttl")]
    pub cache_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl: default_cache_ttl(),
        }
    }
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}
