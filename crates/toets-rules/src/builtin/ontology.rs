use toets_core::context::EvaluationContext;
use toets_core::errors::{ConfigError, RuleError};
use toets_core::models::RuleDefinition;
use toets_core::traits::{Rule, RuleOutcome};

/// Checks the ontological category carried by the context.
///
/// Parameters: `allowed` (list; empty means any), `required` (default true).
#[derive(Debug)]
pub struct OntologicalCategoryRule {
    allowed: Vec<String>,
    required: bool,
}

impl OntologicalCategoryRule {
    pub fn from_definition(definition: &RuleDefinition) -> Result<Self, ConfigError> {
        let allowed = definition
            .param_strings("allowed")?
            .into_iter()
            .map(|c| c.trim().to_lowercase())
            .collect();
        Ok(Self {
            allowed,
            required: definition.param_bool("required").unwrap_or(true),
        })
    }
}

impl Rule for OntologicalCategoryRule {
    fn evaluate(&self, ctx: &EvaluationContext) -> Result<RuleOutcome, RuleError> {
        let Some(category) = ctx.ontological_category() else {
            return Ok(if self.required {
                RuleOutcome::fail("No ontological category given")
                    .with_suggestion("State whether the term is a type, process, result or exemplar")
            } else {
                RuleOutcome::pass()
            });
        };

        let normalized = category.trim().to_lowercase();
        if self.allowed.is_empty() || self.allowed.contains(&normalized) {
            Ok(RuleOutcome::pass())
        } else {
            Ok(RuleOutcome::fail(format!(
                "Ontological category '{category}' is not one of: {}",
                self.allowed.join(", ")
            )))
        }
    }
}
