//! Rule registry errors.

use super::error_code::{self, ToetsErrorCode};
use super::ConfigError;

/// Errors returned by registry lookups.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("Rule not found: {id}")]
    NotFound { id: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ToetsErrorCode for RegistryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => error_code::RULE_NOT_FOUND,
            Self::Config(e) => e.error_code(),
        }
    }
}
