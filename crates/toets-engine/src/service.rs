//! ValidationService: the long-lived, shared entry point.
//!
//! Holds only immutable collaborators. Every per-request value travels in
//! the `EvaluationContext` argument, so one service serves any number of
//! concurrent callers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use rayon::prelude::*;
use tracing::{debug, error, info, info_span, warn};

use toets_core::config::{BatchConfig, ToetsConfig};
use toets_core::constants::RESULT_SCHEMA_VERSION;
use toets_core::context::EvaluationContext;
use toets_core::errors::{error_code, ConcurrencyError, ConfigError, ServiceError};
use toets_core::models::{RuleResult, RuleStatus, SystemInfo, ValidationResult, Violation};
use toets_core::traits::DefinitionRepository;
use toets_rules::{BuiltinDeps, DirectorySource, RuleCatalog, RuleEvaluator, RuleRegistry};

use crate::scoring::{ScoringAggregator, ScoringPolicy};

pub struct ValidationService {
    registry: Arc<RuleRegistry>,
    evaluator: RuleEvaluator,
    aggregator: ScoringAggregator,
    batch: BatchConfig,
}

impl ValidationService {
    pub fn new(registry: Arc<RuleRegistry>, scoring: ScoringPolicy, batch: BatchConfig) -> Self {
        Self {
            registry,
            evaluator: RuleEvaluator::new(Duration::from_millis(batch.effective_slow_rule_ms())),
            aggregator: ScoringAggregator::new(scoring),
            batch,
        }
    }

    /// Build a service over the configured rule directory with the built-in
    /// rule kinds. Rules are loaded lazily on the first validation.
    pub fn from_config(
        config: &ToetsConfig,
        repository: Option<Arc<dyn DefinitionRepository>>,
    ) -> Result<Self, ConfigError> {
        ToetsConfig::validate(config)?;
        let rules_dir = config
            .registry
            .rules_dir
            .clone()
            .ok_or_else(|| ConfigError::ValidationFailed {
                field: "registry.rules_dir".to_string(),
                message: "a rule directory is required".to_string(),
            })?;

        let catalog = RuleCatalog::builtin(BuiltinDeps {
            repository,
            cache: config.cache.clone(),
        });
        let scoring = ScoringPolicy::from_config(&config.scoring)?;
        info!(
            rules_dir = %rules_dir.display(),
            threshold = scoring.accept_threshold(),
            "validation service ready"
        );
        let registry = RuleRegistry::new(
            Box::new(DirectorySource::new(rules_dir)),
            catalog,
            &config.registry,
        );
        Ok(Self::new(Arc::new(registry), scoring, config.batch.clone()))
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    pub fn scoring_policy(&self) -> &ScoringPolicy {
        self.aggregator.policy()
    }

    /// Validate one definition.
    ///
    /// Only a registry that cannot load any rule is an `Err`; blank input
    /// yields a degraded result.
    pub fn validate(&self, ctx: &EvaluationContext) -> Result<ValidationResult, ServiceError> {
        let span = info_span!("validate", correlation_id = %ctx.correlation_id());
        let _enter = span.enter();
        let started = Instant::now();

        if let Some(problem) = input_problem(ctx) {
            warn!(problem, "rejecting input");
            return Ok(ValidationResult::degraded(
                ctx.correlation_id(),
                format!("[{}] {problem}", error_code::INVALID_INPUT),
                elapsed_ms(started),
            ));
        }

        let rules = self.registry.list_enabled()?;
        let results: Vec<RuleResult> = if self.batch.effective_parallel_rules() && rules.len() > 1 {
            rules
                .par_iter()
                .map(|rule| self.evaluator.evaluate(rule, ctx))
                .collect()
        } else {
            rules
                .iter()
                .map(|rule| self.evaluator.evaluate(rule, ctx))
                .collect()
        };

        let summary = self.aggregator.aggregate(&results);
        let inconclusive_rules: Vec<String> = results
            .iter()
            .filter(|r| r.status == RuleStatus::Inconclusive)
            .map(|r| r.rule_id.clone())
            .collect();
        // A rule that could not run leaves the verdict unproven: report what
        // did run, but never accept.
        let dependency_error = (!inconclusive_rules.is_empty()).then(|| {
            format!(
                "[{}] dependency unavailable for rules: {}",
                error_code::DEPENDENCY_ERROR,
                inconclusive_rules.join(", ")
            )
        });
        let result = ValidationResult {
            version: RESULT_SCHEMA_VERSION.to_string(),
            overall_score: summary.overall_score,
            is_acceptable: summary.is_acceptable && dependency_error.is_none(),
            violations: results
                .iter()
                .filter(|r| r.is_violation())
                .map(Violation::from_rule_result)
                .collect(),
            passed_rules: results
                .iter()
                .filter(|r| r.passed())
                .map(|r| r.rule_id.clone())
                .collect(),
            detailed_scores: summary.detailed_scores,
            system: SystemInfo {
                correlation_id: ctx.correlation_id().to_string(),
                timestamp: chrono::Utc::now(),
                duration_ms: elapsed_ms(started),
                error: dependency_error,
                inconclusive_rules,
            },
        };

        debug!(
            overall_score = result.overall_score,
            acceptable = result.is_acceptable,
            violations = result.violations.len(),
            "validation finished"
        );
        Ok(result)
    }

    /// Validate many definitions with at most `max_concurrency` workers.
    /// `results[i]` always belongs to `contexts[i]`.
    pub fn batch_validate(
        &self,
        contexts: &[EvaluationContext],
        max_concurrency: usize,
    ) -> Result<Vec<ValidationResult>, ServiceError> {
        if max_concurrency == 0 {
            return Err(ServiceError::InvalidArgument {
                field: "max_concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if contexts.is_empty() {
            return Ok(Vec::new());
        }
        // An empty registry fails the whole batch, once.
        self.registry.list_enabled()?;

        info!(items = contexts.len(), max_concurrency, "batch started");
        if max_concurrency == 1 {
            return contexts.iter().map(|ctx| self.validate_item(ctx)).collect();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_concurrency.min(contexts.len()))
            .thread_name(|i| format!("toets-batch-{i}"))
            .build()
            .map_err(|e| {
                let err = ConcurrencyError::PoolBuild {
                    message: e.to_string(),
                };
                error!(error = %err, "batch pool unavailable");
                err
            })?;

        pool.install(|| {
            contexts
                .par_iter()
                .map(|ctx| self.validate_item(ctx))
                .collect()
        })
    }

    /// Like [`batch_validate`](Self::batch_validate), but the caller stops
    /// waiting after `timeout`. Work already started runs to completion on
    /// its own thread and its results are discarded.
    pub fn batch_validate_with_timeout(
        self: &Arc<Self>,
        contexts: Vec<EvaluationContext>,
        max_concurrency: usize,
        timeout: Duration,
    ) -> Result<Vec<ValidationResult>, ServiceError> {
        if max_concurrency == 0 {
            return Err(ServiceError::InvalidArgument {
                field: "max_concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let (tx, rx) = crossbeam_channel::bounded(1);
        let service = Arc::clone(self);
        std::thread::Builder::new()
            .name("toets-batch-driver".to_string())
            .spawn(move || {
                let outcome = service.batch_validate(&contexts, max_concurrency);
                // The receiver is gone if the caller timed out.
                let _ = tx.send(outcome);
            })
            .map_err(|e| ConcurrencyError::PoolBuild {
                message: e.to_string(),
            })?;

        match rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(timeout_ms, "batch abandoned");
                Err(ServiceError::Timeout { timeout_ms })
            }
            Err(RecvTimeoutError::Disconnected) => {
                let err = ConcurrencyError::WorkerLost {
                    operation: "batch_validate".to_string(),
                };
                error!(error = %err, "batch driver exited without a result");
                Err(err.into())
            }
        }
    }

    /// Batch with the configured `max_concurrency`, and the configured
    /// timeout when one is set.
    pub fn batch_validate_configured(
        self: &Arc<Self>,
        contexts: Vec<EvaluationContext>,
    ) -> Result<Vec<ValidationResult>, ServiceError> {
        let max_concurrency = self.batch.effective_max_concurrency();
        match self.batch.timeout_ms {
            Some(ms) => self.batch_validate_with_timeout(contexts, max_concurrency, Duration::from_millis(ms)),
            None => self.batch_validate(&contexts, max_concurrency),
        }
    }

    /// One batch item. A panic outside the rule boundary degrades this item
    /// only.
    fn validate_item(&self, ctx: &EvaluationContext) -> Result<ValidationResult, ServiceError> {
        let started = Instant::now();
        match catch_unwind(AssertUnwindSafe(|| self.validate(ctx))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic payload".to_string());
                error!(
                    correlation_id = %ctx.correlation_id(),
                    panic = %message,
                    "validation panicked"
                );
                Ok(ValidationResult::degraded(
                    ctx.correlation_id(),
                    format!("[{}] validation panicked: {message}", error_code::INTERNAL_ERROR),
                    elapsed_ms(started),
                ))
            }
        }
    }
}

impl std::fmt::Debug for ValidationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationService")
            .field("registry", &self.registry)
            .field("scoring", self.aggregator.policy())
            .field("batch", &self.batch)
            .finish()
    }
}

fn input_problem(ctx: &EvaluationContext) -> Option<&'static str> {
    if ctx.begrip().is_empty() {
        Some("begrip is empty")
    } else if ctx.cleaned_text().is_empty() {
        Some("definition text is empty")
    } else {
        None
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
