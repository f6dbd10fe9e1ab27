//! Top-level Toets configuration with layered resolution.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{BatchConfig, CacheConfig, EmptyCategoryPolicy, RegistryConfig, ScoringConfig};
use crate::constants::PROJECT_CONFIG_FILE;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`TOETS_*`)
/// 3. Project config (`toets.toml` in project root)
/// 4. User config (`~/.toets/config.toml`)
/// 5. Compiled defaults
///
/// Scalars override when set; maps merge per key.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ToetsConfig {
    pub scoring: ScoringConfig,
    pub registry: RegistryConfig,
    pub cache: CacheConfig,
    pub batch: BatchConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub accept_threshold: Option<f64>,
    pub rules_dir: Option<PathBuf>,
    pub max_concurrency: Option<usize>,
    pub parallel_rules: Option<bool>,
}

impl ToetsConfig {
    /// Load configuration with layered resolution, then validate it.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                Self::merge_toml_file(&mut config, &user_config_path)?;
            }
        }

        // Layer 3: project config
        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config)?;

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: ToetsConfig = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Reject out-of-range values up front so evaluation never sees them.
    pub fn validate(config: &ToetsConfig) -> Result<(), ConfigError> {
        check_unit_interval(
            "scoring.overall_accept_threshold",
            config.scoring.overall_accept_threshold,
        )?;
        for (category, min) in &config.scoring.category_min {
            check_unit_interval(&format!("scoring.category_min.{category}"), Some(*min))?;
        }
        for (rule_id, weight) in &config.registry.rule_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::ValidationFailed {
                    field: format!("registry.rule_weights.{rule_id}"),
                    message: format!("must be a finite number >= 0, got {weight}"),
                });
            }
        }
        if config.batch.max_concurrency == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "batch.max_concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if config.batch.timeout_ms == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "batch.timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.cache.ttl_seconds == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "cache.ttl_seconds".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.registry.cache_ttl_seconds == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "registry.cache_ttl_seconds".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the user config path: `~/.toets/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".toets").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut ToetsConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: ToetsConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, file_config);
        ::tracing::debug!(path = %path.display(), "merged config file");
        Ok(())
    }

    /// Merge `other` into `base`. `Some` scalars in `other` win; map entries
    /// merge per key; non-empty lists replace.
    pub fn merge(base: &mut ToetsConfig, other: ToetsConfig) {
        // Scoring
        if other.scoring.overall_accept_threshold.is_some() {
            base.scoring.overall_accept_threshold = other.scoring.overall_accept_threshold;
        }
        if other.scoring.empty_category_policy.is_some() {
            base.scoring.empty_category_policy = other.scoring.empty_category_policy;
        }
        base.scoring.category_min.extend(other.scoring.category_min);

        // Registry
        if other.registry.rules_dir.is_some() {
            base.registry.rules_dir = other.registry.rules_dir;
        }
        if !other.registry.disabled_rules.is_empty() {
            base.registry.disabled_rules = other.registry.disabled_rules;
        }
        base.registry.rule_weights.extend(other.registry.rule_weights);
        if other.registry.cache_ttl_seconds.is_some() {
            base.registry.cache_ttl_seconds = other.registry.cache_ttl_seconds;
        }

        // Cache
        if other.cache.ttl_seconds.is_some() {
            base.cache.ttl_seconds = other.cache.ttl_seconds;
        }
        if other.cache.max_entries.is_some() {
            base.cache.max_entries = other.cache.max_entries;
        }

        // Batch
        if other.batch.max_concurrency.is_some() {
            base.batch.max_concurrency = other.batch.max_concurrency;
        }
        if other.batch.parallel_rules.is_some() {
            base.batch.parallel_rules = other.batch.parallel_rules;
        }
        if other.batch.timeout_ms.is_some() {
            base.batch.timeout_ms = other.batch.timeout_ms;
        }
        if other.batch.slow_rule_ms.is_some() {
            base.batch.slow_rule_ms = other.batch.slow_rule_ms;
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `TOETS_SCORING_ACCEPT_THRESHOLD`, `TOETS_BATCH_MAX_CONCURRENCY`, etc.
    /// Unparseable values are rejected rather than ignored.
    fn apply_env_overrides(config: &mut ToetsConfig) -> Result<(), ConfigError> {
        if let Some(v) = env_parsed::<f64>("TOETS_SCORING_ACCEPT_THRESHOLD")? {
            config.scoring.overall_accept_threshold = Some(v);
        }
        if let Some(v) = env_parsed::<EmptyCategoryPolicy>("TOETS_SCORING_EMPTY_CATEGORY_POLICY")? {
            config.scoring.empty_category_policy = Some(v);
        }
        if let Ok(val) = std::env::var("TOETS_REGISTRY_RULES_DIR") {
            config.registry.rules_dir = Some(PathBuf::from(val));
        }
        if let Some(v) = env_parsed::<u64>("TOETS_CACHE_TTL_SECONDS")? {
            config.cache.ttl_seconds = Some(v);
        }
        if let Some(v) = env_parsed::<usize>("TOETS_BATCH_MAX_CONCURRENCY")? {
            config.batch.max_concurrency = Some(v);
        }
        if let Some(v) = env_parsed::<bool>("TOETS_BATCH_PARALLEL_RULES")? {
            config.batch.parallel_rules = Some(v);
        }
        if let Some(v) = env_parsed::<u64>("TOETS_BATCH_TIMEOUT_MS")? {
            config.batch.timeout_ms = Some(v);
        }
        Ok(())
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut ToetsConfig, cli: &CliOverrides) {
        if let Some(v) = cli.accept_threshold {
            config.scoring.overall_accept_threshold = Some(v);
        }
        if let Some(ref v) = cli.rules_dir {
            config.registry.rules_dir = Some(v.clone());
        }
        if let Some(v) = cli.max_concurrency {
            config.batch.max_concurrency = Some(v);
        }
        if let Some(v) = cli.parallel_rules {
            config.batch.parallel_rules = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn check_unit_interval(field: &str, value: Option<f64>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(ConfigError::ValidationFailed {
            field: field.to_string(),
            message: format!("must be between 0.0 and 1.0, got {v}"),
        }),
        _ => Ok(()),
    }
}

fn env_parsed<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::ValidationFailed {
                field: key.to_string(),
                message: format!("cannot parse {val:?}: {e}"),
            }),
        Err(_) => Ok(None),
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
