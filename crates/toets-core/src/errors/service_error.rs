//! Errors that cross the validation service boundary.

use super::error_code::{self, ToetsErrorCode};
use super::{ConcurrencyError, ConfigError};

/// The only failures `validate`/`batch_validate` surface to callers.
/// Everything narrower (a rule, a dependency, one batch item) is contained
/// inside a structured `ValidationResult`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Concurrency error: {0}")]
    Concurrency(#[from] ConcurrencyError),

    #[error("Invalid argument {field}: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("Batch abandoned after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl ToetsErrorCode for ServiceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Concurrency(e) => e.error_code(),
            Self::InvalidArgument { .. } => error_code::INVALID_ARGUMENT,
            Self::Timeout { .. } => error_code::TIMEOUT,
        }
    }
}
