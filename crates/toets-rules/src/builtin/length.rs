use toets_core::context::EvaluationContext;
use toets_core::errors::{ConfigError, RuleError};
use toets_core::models::RuleDefinition;
use toets_core::traits::{Rule, RuleOutcome};

use super::invalid_parameter;

/// Word-count bounds on the cleaned text. Falls short or overshoots with a
/// partial score proportional to the distance from the bound.
#[derive(Debug)]
pub struct LengthBoundsRule {
    min_words: Option<u64>,
    max_words: Option<u64>,
}

impl LengthBoundsRule {
    pub fn from_definition(definition: &RuleDefinition) -> Result<Self, ConfigError> {
        let min_words = definition.param_u64("min_words");
        let max_words = definition.param_u64("max_words");
        match (min_words, max_words) {
            (None, None) => Err(invalid_parameter(
                definition,
                "min_words",
                "at least one of min_words or max_words is required",
            )),
            (Some(min), Some(max)) if min > max => Err(invalid_parameter(
                definition,
                "min_words",
                format!("min_words ({min}) exceeds max_words ({max})"),
            )),
            (_, Some(0)) => Err(invalid_parameter(definition, "max_words", "must be at least 1")),
            _ => Ok(Self { min_words, max_words }),
        }
    }
}

impl Rule for LengthBoundsRule {
    fn evaluate(&self, ctx: &EvaluationContext) -> Result<RuleOutcome, RuleError> {
        let words = ctx.cleaned_text().split_whitespace().count() as u64;

        if let Some(min) = self.min_words.filter(|&min| words < min) {
            return Ok(RuleOutcome::fail(format!(
                "Definition has {words} words; at least {min} expected"
            ))
            .with_score(words as f64 / min as f64));
        }
        if let Some(max) = self.max_words.filter(|&max| words > max) {
            return Ok(RuleOutcome::fail(format!(
                "Definition has {words} words; at most {max} expected"
            ))
            .with_score(max as f64 / words as f64));
        }
        Ok(RuleOutcome::pass())
    }
}
