//! Rule registry configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where rules come from and how they are adjusted at load.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory of one-rule-per-file TOML definitions.
    pub rules_dir: Option<PathBuf>,
    /// Rule ids to load but never evaluate.
    pub disabled_rules: Vec<String>,
    /// Per-rule weight overrides, applied at load.
    pub rule_weights: BTreeMap<String, f64>,
    /// Reload the rule set after this many seconds. Default: never.
    pub cache_ttl_seconds: Option<u64>,
}
