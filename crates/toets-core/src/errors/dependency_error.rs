//! Dependency errors raised by a rule's external collaborators.

use super::error_code::{self, ToetsErrorCode};

/// A rule's external lookup failed. The rule is marked inconclusive and
/// evaluation of every other rule continues.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DependencyError {
    #[error("Dependency {dependency} unavailable: {message}")]
    Unavailable { dependency: String, message: String },

    #[error("Dependency {dependency} timed out after {timeout_ms}ms")]
    Timeout { dependency: String, timeout_ms: u64 },
}

impl DependencyError {
    /// Shorthand for an `Unavailable` error.
    pub fn unavailable(dependency: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            dependency: dependency.into(),
            message: message.into(),
        }
    }
}

impl ToetsErrorCode for DependencyError {
    fn error_code(&self) -> &'static str {
        error_code::DEPENDENCY_ERROR
    }
}
