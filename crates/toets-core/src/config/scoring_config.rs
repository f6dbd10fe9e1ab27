//! Scoring configuration.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ACCEPT_THRESHOLD;

/// How a category with zero contributing rules is scored against its
/// `category_min` threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmptyCategoryPolicy {
    /// Score the category 1.0, so its minimum is vacuously met.
    #[default]
    VacuousPass,
    /// Score the category 0.0, so any positive minimum fails.
    Fail,
}

impl EmptyCategoryPolicy {
    pub fn empty_score(self) -> f64 {
        match self {
            Self::VacuousPass => 1.0,
            Self::Fail => 0.0,
        }
    }
}

impl FromStr for EmptyCategoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "vacuous_pass" => Ok(Self::VacuousPass),
            "fail" => Ok(Self::Fail),
            other => Err(format!("expected vacuous_pass or fail, got {other:?}")),
        }
    }
}

/// Thresholds used by the scoring aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Minimum overall score for acceptance. Default: 0.75.
    pub overall_accept_threshold: Option<f64>,
    /// Per-category minimum weighted score.
    pub category_min: BTreeMap<String, f64>,
    /// Policy for categories without contributing rules. Default: vacuous_pass.
    pub empty_category_policy: Option<EmptyCategoryPolicy>,
}

impl ScoringConfig {
    pub fn effective_overall_accept_threshold(&self) -> f64 {
        self.overall_accept_threshold.unwrap_or(DEFAULT_ACCEPT_THRESHOLD)
    }

    pub fn effective_empty_category_policy(&self) -> EmptyCategoryPolicy {
        self.empty_category_policy.unwrap_or_default()
    }
}
