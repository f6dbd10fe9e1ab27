//! RuleRegistry: lazy, memoized rule loading.
//!
//! The whole rule set is one entry in a `MemoCache`, so concurrent first
//! callers coalesce onto a single load, a failed load is retried by the
//! next caller, and `reload()` is just an invalidation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use toets_cache::{InvalidationCause, MemoCache};
use toets_core::config::RegistryConfig;
use toets_core::errors::{ConfigError, RegistryError};
use toets_core::models::RuleDefinition;
use toets_core::traits::Rule;

use crate::catalog::RuleCatalog;
use crate::source::RuleSource;

const RULE_SET_KEY: &str = "rule_set";

/// A definition paired with its built implementation. Immutable after load.
pub struct LoadedRule {
    definition: RuleDefinition,
    rule: Box<dyn Rule>,
}

impl LoadedRule {
    pub fn new(definition: RuleDefinition, rule: Box<dyn Rule>) -> Self {
        Self { definition, rule }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn definition(&self) -> &RuleDefinition {
        &self.definition
    }

    pub fn rule(&self) -> &dyn Rule {
        self.rule.as_ref()
    }
}

impl fmt::Debug for LoadedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedRule")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

/// One successful load.
#[derive(Debug)]
pub struct RuleSet {
    enabled: Arc<[Arc<LoadedRule>]>,
    by_id: HashMap<String, Arc<LoadedRule>>,
    skipped: usize,
}

impl RuleSet {
    /// Enabled rules ordered by (category, id).
    pub fn enabled(&self) -> Arc<[Arc<LoadedRule>]> {
        Arc::clone(&self.enabled)
    }

    pub fn get(&self, id: &str) -> Option<Arc<LoadedRule>> {
        self.by_id.get(id).cloned()
    }

    /// Loaded rules, enabled or not.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Records dropped during load.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Load-time adjustments taken from `RegistryConfig`.
#[derive(Debug, Clone, Default)]
struct Overrides {
    disabled: HashSet<String>,
    weights: BTreeMap<String, f64>,
}

pub struct RuleRegistry {
    source: Box<dyn RuleSource>,
    catalog: RuleCatalog,
    overrides: Overrides,
    cache: MemoCache<&'static str, Arc<RuleSet>>,
}

impl RuleRegistry {
    pub fn new(source: Box<dyn RuleSource>, catalog: RuleCatalog, config: &RegistryConfig) -> Self {
        let mut cache = MemoCache::builder("rule_registry");
        if let Some(ttl) = config.cache_ttl_seconds {
            cache = cache.time_to_live(Duration::from_secs(ttl));
        }
        Self {
            source,
            catalog,
            overrides: Overrides {
                disabled: config.disabled_rules.iter().cloned().collect(),
                weights: config.rule_weights.clone(),
            },
            cache: cache.build(),
        }
    }

    /// The current rule set, loading it on first use.
    pub fn rule_set(&self) -> Result<Arc<RuleSet>, ConfigError> {
        self.cache
            .get_or_compute(RULE_SET_KEY, || self.load().map(Arc::new))
    }

    /// Enabled rules ordered by (category, id). Stable across calls until
    /// the next reload.
    pub fn list_enabled(&self) -> Result<Arc<[Arc<LoadedRule>]>, ConfigError> {
        Ok(self.rule_set()?.enabled())
    }

    pub fn get(&self, id: &str) -> Result<Arc<LoadedRule>, RegistryError> {
        self.rule_set()?
            .get(id)
            .ok_or_else(|| RegistryError::NotFound { id: id.to_string() })
    }

    /// Drop the loaded rule set; the next call loads again. Returns whether
    /// anything was loaded.
    ///
    /// A load already in flight still hands its rule set to the callers
    /// waiting on it, but that set is not kept: the first call after
    /// `reload()` returns always reads the source again.
    pub fn reload(&self) -> bool {
        let dropped = self.cache.invalidate(&RULE_SET_KEY);
        info!(source = %self.source.name(), dropped, "rule set invalidated");
        dropped
    }

    /// Called whenever the loaded rule set is dropped, by `reload()` or
    /// by TTL expiry.
    pub fn on_reload<F>(&self, listener: F)
    where
        F: Fn(InvalidationCause) + Send + Sync + 'static,
    {
        self.cache.on_invalidate(move |_, cause| listener(cause));
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    fn load(&self) -> Result<RuleSet, ConfigError> {
        let source_name = self.source.name();
        let records = self.source.read().inspect_err(|e| {
            error!(source = %source_name, error = %e, "rule source unreadable");
        })?;

        let mut by_id: HashMap<String, Arc<LoadedRule>> = HashMap::new();
        let mut skipped = 0usize;

        for record in records {
            let mut definition = match record.parsed {
                Ok(definition) => definition,
                Err(e) => {
                    warn!(origin = %record.origin, error = %e, "skipping malformed rule definition");
                    skipped += 1;
                    continue;
                }
            };

            if by_id.contains_key(&definition.id) {
                warn!(origin = %record.origin, rule_id = %definition.id, "skipping duplicate rule id");
                skipped += 1;
                continue;
            }

            if let Some(&weight) = self.overrides.weights.get(&definition.id) {
                definition.weight = weight;
            }
            if self.overrides.disabled.contains(&definition.id) {
                definition.enabled = false;
            }

            let rule = match definition.validate().and_then(|()| self.catalog.build(&definition)) {
                Ok(rule) => rule,
                Err(e) => {
                    warn!(origin = %record.origin, rule_id = %definition.id, error = %e, "skipping rule that failed to build");
                    skipped += 1;
                    continue;
                }
            };

            by_id.insert(definition.id.clone(), Arc::new(LoadedRule::new(definition, rule)));
        }

        if by_id.is_empty() {
            error!(source = %source_name, skipped, "no rules loaded");
            return Err(ConfigError::NoRulesLoaded {
                source_name,
                skipped,
            });
        }

        let mut enabled: Vec<Arc<LoadedRule>> = by_id
            .values()
            .filter(|r| r.definition.enabled)
            .cloned()
            .collect();
        enabled.sort_by(|a, b| {
            (&a.definition.category, &a.definition.id).cmp(&(&b.definition.category, &b.definition.id))
        });

        info!(
            source = %source_name,
            loaded = by_id.len(),
            enabled = enabled.len(),
            skipped,
            "rule set loaded"
        );

        Ok(RuleSet {
            enabled: enabled.into(),
            by_id,
            skipped,
        })
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("source", &self.source.name())
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}
