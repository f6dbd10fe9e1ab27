//! Batch and scheduling configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_CONCURRENCY, DEFAULT_SLOW_RULE_MS};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker count for `batch_validate`. Default: 4.
    pub max_concurrency: Option<usize>,
    /// Evaluate the rules of one request in parallel. Default: false.
    pub parallel_rules: Option<bool>,
    /// Caller-side batch timeout in milliseconds. Default: none.
    pub timeout_ms: Option<u64>,
    /// Rules slower than this are logged at warn level. Default: 250.
    pub slow_rule_ms: Option<u64>,
}

impl BatchConfig {
    pub fn effective_max_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY)
    }

    pub fn effective_parallel_rules(&self) -> bool {
        self.parallel_rules.unwrap_or(false)
    }

    pub fn effective_slow_rule_ms(&self) -> u64 {
        self.slow_rule_ms.unwrap_or(DEFAULT_SLOW_RULE_MS)
    }
}
