//! The evaluator turns every rule ending into a `RuleResult`.

use std::sync::Arc;
use std::time::Duration;

use test_fixtures::{context, ErroringRule, FixedRule, PanickingRule, SelectiveRepository, SlowRule};
use toets_core::models::{RuleDefinition, RuleStatus, Severity};
use toets_rules::builtin::DuplicateDefinitionRule;
use toets_rules::{LoadedRule, RuleEvaluator};

fn loaded(rule: impl toets_core::traits::Rule + 'static) -> LoadedRule {
    LoadedRule::new(
        RuleDefinition::new("R-01", "ESS", "test").with_severity(Severity::Warning),
        Box::new(rule),
    )
}

#[test]
fn passing_and_failing_outcomes_keep_definition_metadata() {
    let evaluator = RuleEvaluator::default();
    let ctx = context("fiets", "voertuig met twee wielen");

    let pass = evaluator.evaluate(&loaded(FixedRule::passing()), &ctx);
    assert_eq!(pass.status, RuleStatus::Passed);
    assert_eq!(pass.score, 1.0);
    assert_eq!(pass.category, "ESS");

    let fail = evaluator.evaluate(&loaded(FixedRule::failing("too vague")), &ctx);
    assert_eq!(fail.status, RuleStatus::Failed);
    assert_eq!(fail.severity, Severity::Warning);
    assert_eq!(fail.message, "too vague");
}

#[test]
fn out_of_range_scores_are_clipped() {
    let mut rule = FixedRule::passing();
    rule.outcome.score = 7.5;
    let result = RuleEvaluator::default().evaluate(&loaded(rule), &context("a", "b c d"));
    assert_eq!(result.score, 1.0);
}

#[test]
fn execution_error_becomes_errored_result() {
    let result = RuleEvaluator::default().evaluate(&loaded(ErroringRule), &context("a", "b"));
    assert_eq!(result.status, RuleStatus::Errored);
    assert_eq!(result.severity, Severity::Error);
    assert_eq!(result.score, 0.0);
    assert!(result.message.starts_with("[RULE_EXECUTION_ERROR]"));
}

#[test]
fn panic_becomes_errored_result() {
    let result = RuleEvaluator::default().evaluate(&loaded(PanickingRule), &context("boom", "b"));
    assert_eq!(result.status, RuleStatus::Errored);
    assert!(result.message.contains("rule blew up on 'boom'"));
}

#[test]
fn dependency_failure_becomes_inconclusive() {
    let repository = Arc::new(SelectiveRepository::failing_for(["fiets"]));
    let definition = RuleDefinition::new("SAM-01", "SAM", "duplicate_definition");
    let rule = DuplicateDefinitionRule::from_definition(&definition, repository.clone()).unwrap();
    let loaded = LoadedRule::new(definition, Box::new(rule));
    let evaluator = RuleEvaluator::default();

    let failed = evaluator.evaluate(&loaded, &context("fiets", "voertuig"));
    assert_eq!(failed.status, RuleStatus::Inconclusive);
    assert!(!failed.contributes());
    assert!(failed.message.starts_with("[DEPENDENCY_ERROR]"));

    let fine = evaluator.evaluate(&loaded, &context("auto", "voertuig"));
    assert_eq!(fine.status, RuleStatus::Passed);
    assert_eq!(repository.calls(), 2);
}

#[test]
fn slow_rules_still_complete() {
    let evaluator = RuleEvaluator::new(Duration::from_millis(1));
    let result = evaluator.evaluate(&loaded(SlowRule(Duration::from_millis(5))), &context("a", "b"));
    assert_eq!(result.status, RuleStatus::Passed);
}
