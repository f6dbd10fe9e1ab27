//! Rule-level memoization cache configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL_SECS};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry time-to-live. Default: 3600.
    pub ttl_seconds: Option<u64>,
    /// Capacity bound. Default: 10_000.
    pub max_entries: Option<u64>,
}

impl CacheConfig {
    pub fn effective_ttl_seconds(&self) -> u64 {
        self.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS)
    }

    pub fn effective_max_entries(&self) -> u64 {
        self.max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES)
    }
}
