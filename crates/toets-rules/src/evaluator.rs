//! Runs one rule against one context. Never fails.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use toets_core::constants::DEFAULT_SLOW_RULE_MS;
use toets_core::context::EvaluationContext;
use toets_core::errors::{error_code, RuleError, ToetsErrorCode};
use toets_core::models::RuleResult;

use crate::registry::LoadedRule;

/// Turns every way a rule can end into a `RuleResult`.
///
/// - `Ok(outcome)` → passed / failed with the outcome's score.
/// - `RuleError::Execution` or a panic → errored, score 0.
/// - `RuleError::Dependency` → inconclusive.
#[derive(Debug, Clone, Copy)]
pub struct RuleEvaluator {
    slow_rule_threshold: Duration,
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_SLOW_RULE_MS))
    }
}

impl RuleEvaluator {
    pub fn new(slow_rule_threshold: Duration) -> Self {
        Self { slow_rule_threshold }
    }

    pub fn slow_rule_threshold(&self) -> Duration {
        self.slow_rule_threshold
    }

    pub fn evaluate(&self, loaded: &LoadedRule, ctx: &EvaluationContext) -> RuleResult {
        let definition = loaded.definition();
        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| loaded.rule().evaluate(ctx)));
        let elapsed = started.elapsed();

        if elapsed > self.slow_rule_threshold {
            warn!(
                rule_id = %definition.id,
                correlation_id = %ctx.correlation_id(),
                elapsed_ms = elapsed.as_millis() as u64,
                "slow rule"
            );
        }

        match outcome {
            Ok(Ok(outcome)) => {
                debug!(rule_id = %definition.id, passed = outcome.passed, "rule evaluated");
                RuleResult::from_outcome(definition, outcome)
            }
            Ok(Err(RuleError::Dependency(e))) => {
                warn!(
                    rule_id = %definition.id,
                    correlation_id = %ctx.correlation_id(),
                    error = %e,
                    "rule dependency failed; result inconclusive"
                );
                RuleResult::inconclusive(definition, e.coded_message())
            }
            Ok(Err(e)) => {
                warn!(
                    rule_id = %definition.id,
                    correlation_id = %ctx.correlation_id(),
                    error = %e,
                    "rule execution failed"
                );
                RuleResult::errored(definition, e.coded_message())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    rule_id = %definition.id,
                    correlation_id = %ctx.correlation_id(),
                    panic = %message,
                    "rule panicked"
                );
                RuleResult::errored(
                    definition,
                    format!("[{}] rule panicked: {message}", error_code::RULE_EXECUTION_ERROR),
                )
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
