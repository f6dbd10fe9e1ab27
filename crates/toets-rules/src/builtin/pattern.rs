use regex::{Regex, RegexBuilder};

use toets_core::context::EvaluationContext;
use toets_core::errors::{ConfigError, RuleError};
use toets_core::models::RuleDefinition;
use toets_core::traits::{Rule, RuleOutcome};

use super::invalid_parameter;

/// Whether a match is the violation or the requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternMode {
    Forbidden,
    Required,
}

/// Which text a pattern runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextTarget {
    #[default]
    Cleaned,
    Raw,
}

/// Regex rule over the definition text.
///
/// Parameters: `patterns` (list, required), `case_insensitive` (default
/// true), `target` (`cleaned` | `raw`), `message`, `suggestion`.
#[derive(Debug)]
pub struct PatternRule {
    mode: PatternMode,
    patterns: Vec<Regex>,
    target: TextTarget,
    message: String,
    suggestion: Option<String>,
}

impl PatternRule {
    pub fn from_definition(definition: &RuleDefinition, mode: PatternMode) -> Result<Self, ConfigError> {
        let sources = definition.param_strings("patterns")?;
        if sources.is_empty() {
            return Err(invalid_parameter(definition, "patterns", "at least one pattern is required"));
        }
        let case_insensitive = definition.param_bool("case_insensitive").unwrap_or(true);
        let patterns = sources
            .iter()
            .map(|source| {
                RegexBuilder::new(source)
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|e| invalid_parameter(definition, "patterns", e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let target = match definition.param_str("target") {
            None | Some("cleaned") => TextTarget::Cleaned,
            Some("raw") => TextTarget::Raw,
            Some(other) => {
                return Err(invalid_parameter(
                    definition,
                    "target",
                    format!("expected 'cleaned' or 'raw', got '{other}'"),
                ))
            }
        };

        let message = definition
            .param_str("message")
            .map(str::to_string)
            .unwrap_or_else(|| match mode {
                PatternMode::Forbidden => format!("{}: forbidden pattern found", definition.id),
                PatternMode::Required => format!("{}: required pattern missing", definition.id),
            });

        Ok(Self {
            mode,
            patterns,
            target,
            message,
            suggestion: definition.param_str("suggestion").map(str::to_string),
        })
    }

    fn failure(&self) -> RuleOutcome {
        let outcome = RuleOutcome::fail(self.message.clone());
        match &self.suggestion {
            Some(s) => outcome.with_suggestion(s.clone()),
            None => outcome,
        }
    }
}

impl Rule for PatternRule {
    fn evaluate(&self, ctx: &EvaluationContext) -> Result<RuleOutcome, RuleError> {
        let text = match self.target {
            TextTarget::Cleaned => ctx.cleaned_text(),
            TextTarget::Raw => ctx.raw_text(),
        };
        let first_match = self.patterns.iter().find_map(|p| p.find(text));

        Ok(match (self.mode, first_match) {
            (PatternMode::Forbidden, Some(m)) => self.failure().at(m.start(), m.end()),
            (PatternMode::Forbidden, None) => RuleOutcome::pass(),
            (PatternMode::Required, Some(_)) => RuleOutcome::pass(),
            (PatternMode::Required, None) => self.failure(),
        })
    }
}
