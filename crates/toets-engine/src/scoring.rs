//! ScoringAggregator: weighted per-category and overall scores.
//!
//! Only contributing results count (finite weight > 0, not inconclusive).
//! Scores are clipped to [0, 1] on the way in and on the way out.

use std::collections::BTreeMap;

use toets_core::config::{EmptyCategoryPolicy, ScoringConfig};
use toets_core::errors::ConfigError;
use toets_core::models::{clip_score, RuleResult};

/// Validated acceptance thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    accept_threshold: f64,
    category_min: BTreeMap<String, f64>,
    empty_category_policy: EmptyCategoryPolicy,
}

impl ScoringPolicy {
    pub fn new(
        accept_threshold: f64,
        category_min: BTreeMap<String, f64>,
        empty_category_policy: EmptyCategoryPolicy,
    ) -> Result<Self, ConfigError> {
        unit_interval("scoring.overall_accept_threshold", accept_threshold)?;
        for (category, min) in &category_min {
            unit_interval(&format!("scoring.category_min.{category}"), *min)?;
        }
        Ok(Self {
            accept_threshold,
            category_min,
            empty_category_policy,
        })
    }

    pub fn from_config(config: &ScoringConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.effective_overall_accept_threshold(),
            config.category_min.clone(),
            config.effective_empty_category_policy(),
        )
    }

    pub fn accept_threshold(&self) -> f64 {
        self.accept_threshold
    }

    pub fn category_min(&self) -> &BTreeMap<String, f64> {
        &self.category_min
    }

    pub fn empty_category_policy(&self) -> EmptyCategoryPolicy {
        self.empty_category_policy
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            accept_threshold: ScoringConfig::default().effective_overall_accept_threshold(),
            category_min: BTreeMap::new(),
            empty_category_policy: EmptyCategoryPolicy::default(),
        }
    }
}

fn unit_interval(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed {
            field: field.to_string(),
            message: format!("must be within [0, 1], got {value}"),
        })
    }
}

/// Aggregated scores for one validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub overall_score: f64,
    pub is_acceptable: bool,
    /// Category → weighted score, for every evaluated category and every
    /// category with a configured minimum.
    pub detailed_scores: BTreeMap<String, f64>,
    /// Categories whose minimum was not met.
    pub failed_categories: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Weighted {
    weighted_sum: f64,
    total_weight: f64,
}

impl Weighted {
    fn add(&mut self, result: &RuleResult) {
        self.weighted_sum += result.weight * clip_score(result.score);
        self.total_weight += result.weight;
    }

    fn average(&self) -> Option<f64> {
        (self.total_weight > 0.0).then(|| clip_score(self.weighted_sum / self.total_weight))
    }
}

/// `RuleResult` fields are public, so re-check what `contributes()` cannot:
/// an infinite or NaN weight never takes part.
fn counts(result: &RuleResult) -> bool {
    result.contributes() && result.weight.is_finite()
}

#[derive(Debug, Clone, Default)]
pub struct ScoringAggregator {
    policy: ScoringPolicy,
}

impl ScoringAggregator {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn aggregate(&self, results: &[RuleResult]) -> ScoreSummary {
        let mut overall = Weighted::default();
        let mut per_category: BTreeMap<&str, Weighted> = BTreeMap::new();

        for result in results {
            let category = per_category.entry(result.category.as_str()).or_default();
            if counts(result) {
                overall.add(result);
                category.add(result);
            }
        }

        let empty_score = self.policy.empty_category_policy.empty_score();
        let mut detailed_scores: BTreeMap<String, f64> = per_category
            .iter()
            .map(|(category, w)| ((*category).to_string(), w.average().unwrap_or(empty_score)))
            .collect();
        for category in self.policy.category_min.keys() {
            detailed_scores.entry(category.clone()).or_insert(empty_score);
        }

        let failed_categories: Vec<String> = self
            .policy
            .category_min
            .iter()
            .filter(|(category, min)| detailed_scores.get(*category).is_some_and(|s| s < *min))
            .map(|(category, _)| category.clone())
            .collect();

        // Nothing contributed: no evidence, never acceptable.
        let (overall_score, is_acceptable) = match overall.average() {
            Some(score) => (
                score,
                score >= self.policy.accept_threshold && failed_categories.is_empty(),
            ),
            None => (0.0, false),
        };

        ScoreSummary {
            overall_score,
            is_acceptable,
            detailed_scores,
            failed_categories,
        }
    }
}
