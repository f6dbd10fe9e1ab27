//! Fixture loader and test doubles shared by the Toets integration tests.
//!
//! Fixture files live in the workspace-level `test-fixtures/` folder:
//! `rules/` holds a well-formed rule directory, `rules-broken/` one where
//! some records are malformed.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use toets_core::context::EvaluationContext;
use toets_core::errors::{DependencyError, RuleError};
use toets_core::traits::{DefinitionRepository, Rule, RuleOutcome};

/// Root directory of the fixture folder.
fn fixtures_root() -> PathBuf {
    // Walk up from any crate until a folder holding `test-fixtures/rules`
    // is found; `crates/test-fixtures` itself has no `rules/`.
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);
    while !path.join("test-fixtures").join("rules").is_dir() {
        if !path.pop() {
            panic!(
                "Could not find test-fixtures/rules from CARGO_MANIFEST_DIR={}",
                manifest_dir
            );
        }
    }
    path.join("test-fixtures")
}

/// Absolute path to a fixture file or folder.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// The well-formed rule directory.
pub fn rules_dir() -> PathBuf {
    fixture_path("rules")
}

/// A rule directory where some records are malformed.
pub fn broken_rules_dir() -> PathBuf {
    fixture_path("rules-broken")
}

/// Context with a fixed, readable correlation id.
pub fn context(begrip: &str, text: &str) -> EvaluationContext {
    EvaluationContext::builder(begrip, text)
        .correlation_id(format!("test-{begrip}"))
        .build()
}

/// `n` contexts with distinct begrips (`term-0`, `term-1`, ...), each
/// defined without repeating itself.
pub fn distinct_contexts(n: usize) -> Vec<EvaluationContext> {
    (0..n)
        .map(|i| context(&format!("term-{i}"), &format!("an object that serves purpose {i}")))
        .collect()
}

// ============================================================================
// Rule doubles
// ============================================================================

/// Always reports the same outcome.
#[derive(Debug, Clone)]
pub struct FixedRule {
    pub outcome: RuleOutcome,
}

impl FixedRule {
    pub fn passing() -> Self {
        Self { outcome: RuleOutcome::pass() }
    }

    pub fn failing(message: &str) -> Self {
        Self { outcome: RuleOutcome::fail(message) }
    }
}

impl Rule for FixedRule {
    fn evaluate(&self, _ctx: &EvaluationContext) -> Result<RuleOutcome, RuleError> {
        Ok(self.outcome.clone())
    }
}

/// Panics on every evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanickingRule;

impl Rule for PanickingRule {
    fn evaluate(&self, ctx: &EvaluationContext) -> Result<RuleOutcome, RuleError> {
        panic!("rule blew up on '{}'", ctx.begrip());
    }
}

/// Returns `RuleError::Execution` on every evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErroringRule;

impl Rule for ErroringRule {
    fn evaluate(&self, _ctx: &EvaluationContext) -> Result<RuleOutcome, RuleError> {
        Err(RuleError::execution("erroring", "index out of range"))
    }
}

/// Sleeps, then passes.
#[derive(Debug, Clone, Copy)]
pub struct SlowRule(pub Duration);

impl Rule for SlowRule {
    fn evaluate(&self, _ctx: &EvaluationContext) -> Result<RuleOutcome, RuleError> {
        std::thread::sleep(self.0);
        Ok(RuleOutcome::pass())
    }
}

// ============================================================================
// Repository doubles
// ============================================================================

/// Fails for the listed begrips, reports zero matches for the rest, and
/// counts calls.
#[derive(Debug, Default)]
pub struct SelectiveRepository {
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl SelectiveRepository {
    pub fn failing_for<I, S>(begrips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failing: begrips.into_iter().map(Into::into).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DefinitionRepository for SelectiveRepository {
    fn count_matches(&self, begrip: &str, _ctx: &EvaluationContext) -> Result<usize, DependencyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(begrip) {
            Err(DependencyError::unavailable("definitions", format!("lookup for '{begrip}' failed")))
        } else {
            Ok(0)
        }
    }
}

/// Every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRepository;

impl DefinitionRepository for OfflineRepository {
    fn count_matches(&self, _begrip: &str, _ctx: &EvaluationContext) -> Result<usize, DependencyError> {
        Err(DependencyError::unavailable("definitions", "connection refused"))
    }
}
