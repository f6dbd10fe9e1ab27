use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use toets_cache::MemoCache;
use toets_core::context::EvaluationContext;
use toets_core::errors::{ConfigError, RuleError};
use toets_core::models::RuleDefinition;
use toets_core::traits::{Rule, RuleOutcome};

/// Fails when the definition uses the term it defines, as a whole word,
/// case-insensitively.
///
/// The word-boundary pattern for each begrip is compiled once and shared
/// through the memo cache; the begrip itself only ever comes from the
/// context being evaluated.
pub struct CircularDefinitionRule {
    id: String,
    patterns: Arc<MemoCache<String, Arc<Regex>>>,
    message: Option<String>,
}

impl CircularDefinitionRule {
    pub fn from_definition(
        definition: &RuleDefinition,
        patterns: Arc<MemoCache<String, Arc<Regex>>>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            id: definition.id.clone(),
            patterns,
            message: definition.param_str("message").map(str::to_string),
        })
    }

    fn pattern_for(&self, begrip: &str) -> Result<Arc<Regex>, RuleError> {
        self.patterns
            .get_or_compute(begrip.to_lowercase(), || {
                RegexBuilder::new(&format!(r"\b{}\b", regex::escape(begrip)))
                    .case_insensitive(true)
                    .build()
                    .map(Arc::new)
            })
            .map_err(|e| RuleError::execution(&self.id, e.to_string()))
    }
}

impl Rule for CircularDefinitionRule {
    fn evaluate(&self, ctx: &EvaluationContext) -> Result<RuleOutcome, RuleError> {
        let begrip = ctx.begrip();
        if begrip.is_empty() {
            return Ok(RuleOutcome::pass());
        }

        let pattern = self.pattern_for(begrip)?;
        Ok(match pattern.find(ctx.cleaned_text()) {
            Some(m) => RuleOutcome::fail(
                self.message
                    .clone()
                    .unwrap_or_else(|| format!("Definition of '{begrip}' uses the term itself")),
            )
            .at(m.start(), m.end())
            .with_suggestion(format!("Describe '{begrip}' without repeating it")),
            None => RuleOutcome::pass(),
        })
    }
}

impl std::fmt::Debug for CircularDefinitionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircularDefinitionRule")
            .field("id", &self.id)
            .field("pattern_cache", &self.patterns.name())
            .finish_non_exhaustive()
    }
}
