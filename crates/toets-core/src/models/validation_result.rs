//! Versioned validation output schema.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RuleResult, RuleStatus, Severity, TextSpan};
use crate::constants::RESULT_SCHEMA_VERSION;
use crate::errors::error_code;

/// Final outcome of validating one definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub version: String,
    /// Weighted aggregate in [0, 1].
    pub overall_score: f64,
    pub is_acceptable: bool,
    /// Failed and errored rules, in rule order.
    pub violations: Vec<Violation>,
    pub passed_rules: Vec<String>,
    /// Category → weighted category score.
    pub detailed_scores: BTreeMap<String, f64>,
    pub system: SystemInfo,
}

/// A failed rule as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub rule_id: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<TextSpan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl Violation {
    /// Failed rules report their own id as code; errored rules report
    /// `RULE_EXECUTION_ERROR`.
    pub fn from_rule_result(result: &RuleResult) -> Self {
        let code = match result.status {
            RuleStatus::Errored => error_code::RULE_EXECUTION_ERROR.to_string(),
            _ => result.rule_id.clone(),
        };
        Self {
            code,
            severity: result.severity,
            message: result.message.clone(),
            rule_id: result.rule_id.clone(),
            category: result.category.clone(),
            location: result.location,
            suggestions: result.suggestions.clone(),
        }
    }
}

/// Run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Rules whose dependency failed during this run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inconclusive_rules: Vec<String>,
}

impl ValidationResult {
    /// Structured failure for one request: not acceptable, score 0,
    /// `system.error` populated.
    pub fn degraded(correlation_id: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            version: RESULT_SCHEMA_VERSION.to_string(),
            overall_score: 0.0,
            is_acceptable: false,
            violations: Vec::new(),
            passed_rules: Vec::new(),
            detailed_scores: BTreeMap::new(),
            system: SystemInfo {
                correlation_id: correlation_id.into(),
                timestamp: Utc::now(),
                duration_ms,
                error: Some(error.into()),
                inconclusive_rules: Vec::new(),
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.system.error.is_some()
    }

    /// Violation codes in order, handy for comparisons.
    pub fn violation_codes(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.code.as_str()).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
