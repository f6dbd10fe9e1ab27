//! Configuration errors.

use super::error_code::{self, ToetsErrorCode};

/// Errors that can occur while loading config or rule definitions.
/// Fatal at startup only; never raised during evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Config parse error in {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Config validation failed for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Rule source {source_name} is unreadable: {message}")]
    SourceUnreadable { source_name: String, message: String },

    #[error("No rules could be loaded from {source_name} ({skipped} records skipped)")]
    NoRulesLoaded { source_name: String, skipped: usize },
}

impl ToetsErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoRulesLoaded { .. } => error_code::NO_RULES_LOADED,
            _ => error_code::CONFIG_ERROR,
        }
    }
}
