use std::sync::Arc;

use toets_core::context::EvaluationContext;
use toets_core::errors::{ConfigError, RuleError};
use toets_core::models::RuleDefinition;
use toets_core::traits::{DefinitionRepository, Rule, RuleOutcome};

/// Fails when the repository already holds more than `max_existing`
/// definitions of the same begrip (default 0). A repository failure
/// surfaces as `RuleError::Dependency`.
pub struct DuplicateDefinitionRule {
    repository: Arc<dyn DefinitionRepository>,
    max_existing: usize,
    message: Option<String>,
}

impl DuplicateDefinitionRule {
    pub fn from_definition(
        definition: &RuleDefinition,
        repository: Arc<dyn DefinitionRepository>,
    ) -> Result<Self, ConfigError> {
        let max_existing = definition.param_u64("max_existing").unwrap_or(0);
        Ok(Self {
            repository,
            max_existing: usize::try_from(max_existing).unwrap_or(usize::MAX),
            message: definition.param_str("message").map(str::to_string),
        })
    }
}

impl Rule for DuplicateDefinitionRule {
    fn evaluate(&self, ctx: &EvaluationContext) -> Result<RuleOutcome, RuleError> {
        let existing = self.repository.count_matches(ctx.begrip(), ctx)?;
        if existing <= self.max_existing {
            return Ok(RuleOutcome::pass());
        }
        let message = self.message.clone().unwrap_or_else(|| {
            format!("{existing} existing definition(s) found for '{}'", ctx.begrip())
        });
        Ok(RuleOutcome::fail(message).with_suggestion("Review the existing definition first"))
    }
}

impl std::fmt::Debug for DuplicateDefinitionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateDefinitionRule")
            .field("max_existing", &self.max_existing)
            .finish_non_exhaustive()
    }
}
