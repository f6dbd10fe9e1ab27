//! Errors returned by rule implementations.

use super::error_code::{self, ToetsErrorCode};
use super::DependencyError;

/// Errors a rule may return from `Rule::evaluate`.
///
/// Never crosses the evaluator boundary: `Execution` becomes an errored
/// `RuleResult`, `Dependency` becomes an inconclusive one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("Rule {rule_id} failed: {message}")]
    Execution { rule_id: String, message: String },

    #[error("Dependency error: {0}")]
    Dependency(#[from] DependencyError),
}

impl RuleError {
    /// Shorthand for an `Execution` error.
    pub fn execution(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }
}

impl ToetsErrorCode for RuleError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Execution { .. } => error_code::RULE_EXECUTION_ERROR,
            Self::Dependency(e) => e.error_code(),
        }
    }
}
