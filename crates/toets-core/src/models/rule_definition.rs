//! Rule metadata as read from the rule configuration source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Severity;
use crate::errors::ConfigError;

/// Metadata and parameters for one rule. Immutable once the registry has
/// loaded it.
///
/// ```toml
/// id = "CON-01"
/// category = "CON"
/// kind = "circular_definition"
/// weight = 0.8
/// severity = "error"
///
/// [parameters]
/// message = "Definition repeats the term"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: String,
    pub category: String,
    /// Name of the registered implementation that executes this rule.
    pub kind: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
    /// Opaque, kind-specific parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

fn default_weight() -> f64 {
    1.0
}

fn default_enabled() -> bool {
    true
}

impl RuleDefinition {
    /// Minimal definition, mostly for programmatic registration.
    pub fn new(id: impl Into<String>, category: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            kind: kind.into(),
            weight: default_weight(),
            severity: Severity::default(),
            enabled: true,
            description: String::new(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Parse and validate a single TOML rule record.
    pub fn from_toml(origin: &str, contents: &str) -> Result<Self, ConfigError> {
        let definition: RuleDefinition =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?;
        definition.validate()?;
        Ok(definition)
    }

    /// Reject definitions the engine cannot score.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "id".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.category.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: format!("{}.category", self.id),
                message: "must not be empty".to_string(),
            });
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ConfigError::ValidationFailed {
                field: format!("{}.weight", self.id),
                message: format!("must be a finite number >= 0, got {}", self.weight),
            });
        }
        Ok(())
    }

    /// String parameter, if present and a string.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }

    pub fn param_bool(&self, key: &str) -> Option<bool> {
        self.parameters.get(key).and_then(|v| v.as_bool())
    }

    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.parameters.get(key).and_then(|v| v.as_u64())
    }

    /// List-of-strings parameter. Missing → empty; wrong shape → error.
    pub fn param_strings(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        let Some(value) = self.parameters.get(key) else {
            return Ok(Vec::new());
        };
        let invalid = || ConfigError::ValidationFailed {
            field: format!("{}.parameters.{}", self.id, key),
            message: "must be a list of strings".to_string(),
        };
        value
            .as_array()
            .ok_or_else(invalid)?
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(invalid))
            .collect()
    }
}
