use crate::context::EvaluationContext;
use crate::errors::RuleError;
use crate::models::TextSpan;

/// Executable logic behind a rule definition.
///
/// Implementations are built once at registry load and shared read-only
/// across threads. Everything request-specific arrives through `ctx`;
/// an implementation must not stash any of it on `self`.
pub trait Rule: Send + Sync {
    /// Evaluate against one context. Dependency failures are reported as
    /// `RuleError::Dependency`, anything else as `RuleError::Execution`.
    fn evaluate(&self, ctx: &EvaluationContext) -> Result<RuleOutcome, RuleError>;
}

/// What a rule reports for one context.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub passed: bool,
    pub score: f64,
    pub message: String,
    pub location: Option<TextSpan>,
    pub suggestions: Vec<String>,
}

impl RuleOutcome {
    /// Passing outcome, score 1.0.
    pub fn pass() -> Self {
        Self {
            passed: true,
            score: 1.0,
            message: String::new(),
            location: None,
            suggestions: Vec::new(),
        }
    }

    /// Failing outcome, score 0.0.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            score: 0.0,
            message: message.into(),
            location: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn at(mut self, start: usize, end: usize) -> Self {
        self.location = Some(TextSpan { start, end });
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}
