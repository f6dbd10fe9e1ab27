//! EvaluationContext: the immutable input bundle for one validation run.
//!
//! A context is built once per `validate` call and passed by reference
//! through the service, evaluator, and every rule. It has private fields,
//! read-only accessors, and no mutators, so per-request values (the
//! begrip above all) can only travel inside it and never land on a shared
//! component.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Immutable snapshot of everything one validation needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationContext {
    begrip: String,
    raw_text: String,
    cleaned_text: String,
    ontological_category: Option<String>,
    correlation_id: String,
    created_at: DateTime<Utc>,
}

impl EvaluationContext {
    /// Context with a fresh correlation id and the current timestamp.
    pub fn new(begrip: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self::builder(begrip, raw_text).build()
    }

    /// Start building a context for `begrip` defined by `raw_text`.
    pub fn builder(
        begrip: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> EvaluationContextBuilder {
        EvaluationContextBuilder {
            begrip: begrip.into(),
            raw_text: raw_text.into(),
            ontological_category: None,
            correlation_id: None,
            created_at: None,
        }
    }

    /// The term under definition.
    pub fn begrip(&self) -> &str {
        &self.begrip
    }

    /// The definition text exactly as submitted.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Whitespace-normalized text with any leading "begrip:" label removed.
    pub fn cleaned_text(&self) -> &str {
        &self.cleaned_text
    }

    pub fn ontological_category(&self) -> Option<&str> {
        self.ontological_category.as_deref()
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Builder for [`EvaluationContext`]. Consumed by `build`, so every field
/// is fixed exactly once.
#[derive(Debug, Clone)]
pub struct EvaluationContextBuilder {
    begrip: String,
    raw_text: String,
    ontological_category: Option<String>,
    correlation_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl EvaluationContextBuilder {
    pub fn ontological_category(mut self, category: impl Into<String>) -> Self {
        self.ontological_category = Some(category.into());
        self
    }

    /// Use a caller-supplied correlation id instead of a generated one.
    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn created_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.created_at = Some(timestamp);
        self
    }

    pub fn build(self) -> EvaluationContext {
        let begrip = self.begrip.trim().to_string();
        let cleaned_text = clean_text(&self.raw_text, &begrip);
        EvaluationContext {
            cleaned_text,
            begrip,
            raw_text: self.raw_text,
            ontological_category: self
                .ontological_category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            correlation_id: self
                .correlation_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Collapse whitespace runs and strip a leading `"<begrip>:"` label.
fn clean_text(raw: &str, begrip: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if begrip.is_empty() {
        return collapsed;
    }

    let n = begrip.len();
    if collapsed.len() > n
        && collapsed.is_char_boundary(n)
        && collapsed[..n].eq_ignore_ascii_case(begrip)
    {
        if let Some(rest) = collapsed[n..].trim_start().strip_prefix(':') {
            return rest.trim().to_string();
        }
    }
    collapsed
}
