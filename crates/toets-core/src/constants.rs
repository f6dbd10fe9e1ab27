/// Version of the serialized `ValidationResult` schema.
pub const RESULT_SCHEMA_VERSION: &str = "1.0";

/// Default overall acceptance threshold.
pub const DEFAULT_ACCEPT_THRESHOLD: f64 = 0.75;

/// Default worker count for batch validation.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default TTL for generic cache entries (1 hour).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default capacity bound for generic caches.
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 10_000;

/// Rules slower than this are logged at warn level.
pub const DEFAULT_SLOW_RULE_MS: u64 = 250;

/// File name of the project-level config.
pub const PROJECT_CONFIG_FILE: &str = "toets.toml";

/// Environment variable holding the tracing filter.
pub const LOG_ENV_VAR: &str = "TOETS_LOG";
