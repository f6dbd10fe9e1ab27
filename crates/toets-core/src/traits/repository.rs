use crate::context::EvaluationContext;
use crate::errors::DependencyError;

/// Read-only view of stored definitions, used by duplicate detection.
///
/// Any error is a recoverable dependency failure for the calling rule only.
pub trait DefinitionRepository: Send + Sync {
    /// Number of stored definitions that match `begrip` in this context.
    fn count_matches(&self, begrip: &str, ctx: &EvaluationContext) -> Result<usize, DependencyError>;
}
