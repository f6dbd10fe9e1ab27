//! Per-rule evaluation result.

use serde::{Deserialize, Serialize};

use super::{RuleDefinition, Severity};
use crate::traits::RuleOutcome;

/// How a single rule evaluation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Passed,
    Failed,
    /// A dependency failed; the rule produced no evidence either way.
    Inconclusive,
    /// Rule-internal failure (error or panic).
    Errored,
}

/// Byte range in the cleaned text that triggered a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

/// Outcome of one (rule, context) pair. Ephemeral: consumed by the
/// aggregator right after evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule_id: String,
    pub category: String,
    pub weight: f64,
    pub status: RuleStatus,
    pub severity: Severity,
    pub message: String,
    /// Score contribution in [0, 1].
    pub score: f64,
    pub location: Option<TextSpan>,
    pub suggestions: Vec<String>,
}

impl RuleResult {
    /// Build a result from what the rule reported.
    pub fn from_outcome(definition: &RuleDefinition, outcome: RuleOutcome) -> Self {
        Self {
            rule_id: definition.id.clone(),
            category: definition.category.clone(),
            weight: definition.weight,
            status: if outcome.passed {
                RuleStatus::Passed
            } else {
                RuleStatus::Failed
            },
            severity: definition.severity,
            message: outcome.message,
            score: clip_score(outcome.score),
            location: outcome.location,
            suggestions: outcome.suggestions,
        }
    }

    /// Rule-internal failure: severity error, score 0.
    pub fn errored(definition: &RuleDefinition, message: impl Into<String>) -> Self {
        Self {
            rule_id: definition.id.clone(),
            category: definition.category.clone(),
            weight: definition.weight,
            status: RuleStatus::Errored,
            severity: Severity::Error,
            message: message.into(),
            score: 0.0,
            location: None,
            suggestions: Vec::new(),
        }
    }

    /// Dependency failure: no evidence, excluded from scoring.
    pub fn inconclusive(definition: &RuleDefinition, message: impl Into<String>) -> Self {
        Self {
            rule_id: definition.id.clone(),
            category: definition.category.clone(),
            weight: definition.weight,
            status: RuleStatus::Inconclusive,
            severity: Severity::Info,
            message: message.into(),
            score: 0.0,
            location: None,
            suggestions: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == RuleStatus::Passed
    }

    /// Failed and errored results are reported as violations.
    pub fn is_violation(&self) -> bool {
        matches!(self.status, RuleStatus::Failed | RuleStatus::Errored)
    }

    /// Whether this result takes part in the weighted aggregate.
    pub fn contributes(&self) -> bool {
        self.weight > 0.0 && self.status != RuleStatus::Inconclusive
    }
}

/// Clamp a score into [0, 1]; NaN counts as 0.
pub fn clip_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
