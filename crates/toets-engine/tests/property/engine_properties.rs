use std::sync::Arc;

use proptest::prelude::*;
use test_fixtures::distinct_contexts;
use toets_core::config::{BatchConfig, RegistryConfig};
use toets_core::models::{RuleDefinition, RuleResult};
use toets_core::traits::RuleOutcome;
use toets_engine::{ScoringAggregator, ScoringPolicy, ValidationService};
use toets_rules::builtin::kinds;
use toets_rules::{BuiltinDeps, RuleCatalog, RuleRegistry, StaticSource};

fn arb_result() -> impl Strategy<Value = RuleResult> {
    (
        0usize..4,
        0.0f64..5.0,
        any::<bool>(),
        0.0f64..=1.0,
        prop::sample::select(vec!["ESS", "CON", "STR", "SAM"]),
    )
        .prop_map(|(i, weight, passed, score, category)| {
            let outcome = if passed {
                RuleOutcome::pass()
            } else {
                RuleOutcome::fail("failed").with_score(score)
            };
            let definition = RuleDefinition::new(format!("R{i}"), category, "test").with_weight(weight);
            RuleResult::from_outcome(&definition, outcome)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Turning a failing rule into a passing one never lowers the score.
    #[test]
    fn passing_a_rule_never_lowers_overall_score(
        results in prop::collection::vec(arb_result(), 1..12),
        pick in any::<prop::sample::Index>(),
    ) {
        let aggregator = ScoringAggregator::new(ScoringPolicy::default());
        let before = aggregator.aggregate(&results).overall_score;

        let mut flipped = results.clone();
        let i = pick.index(flipped.len());
        let definition = RuleDefinition::new(flipped[i].rule_id.clone(), flipped[i].category.clone(), "test")
            .with_weight(flipped[i].weight);
        flipped[i] = RuleResult::from_outcome(&definition, RuleOutcome::pass());

        let after = aggregator.aggregate(&flipped).overall_score;
        prop_assert!(after + 1e-12 >= before, "before {before}, after {after}");
        prop_assert!((0.0..=1.0).contains(&after));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// For N items and any k in [1, N]: N results, result i for item i.
    #[test]
    fn batch_results_follow_input_order(n in 1usize..24, k_seed in any::<prop::sample::Index>()) {
        let registry = RuleRegistry::new(
            Box::new(StaticSource::new(vec![RuleDefinition::new(
                "CON-01",
                "CON",
                kinds::CIRCULAR_DEFINITION,
            )])),
            RuleCatalog::builtin(BuiltinDeps::default()),
            &RegistryConfig::default(),
        );
        let service = ValidationService::new(Arc::new(registry), ScoringPolicy::default(), BatchConfig::default());

        let contexts = distinct_contexts(n);
        let k = k_seed.index(n) + 1;
        let results = service.batch_validate(&contexts, k).unwrap();

        prop_assert_eq!(results.len(), n);
        for (ctx, result) in contexts.iter().zip(&results) {
            prop_assert_eq!(ctx.correlation_id(), result.system.correlation_id.as_str());
        }
    }
}
