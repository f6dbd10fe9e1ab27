//! Stable error codes carried into `ValidationResult.system.error`.

/// Every error enum implements this to expose a stable, machine-readable
/// code alongside its human-readable message.
pub trait ToetsErrorCode {
    /// Returns the error code string (e.g., "CONFIG_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_message(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const NO_RULES_LOADED: &str = "NO_RULES_LOADED";
pub const RULE_NOT_FOUND: &str = "RULE_NOT_FOUND";
pub const RULE_EXECUTION_ERROR: &str = "RULE_EXECUTION_ERROR";
pub const DEPENDENCY_ERROR: &str = "DEPENDENCY_ERROR";
pub const CONCURRENCY_ERROR: &str = "CONCURRENCY_ERROR";
pub const INVALID_INPUT: &str = "INVALID_INPUT";
pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
pub const TIMEOUT: &str = "TIMEOUT";
