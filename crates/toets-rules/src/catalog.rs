//! Kind → factory mapping for rule implementations.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use toets_cache::MemoCache;
use toets_core::config::CacheConfig;
use toets_core::errors::ConfigError;
use toets_core::models::RuleDefinition;
use toets_core::traits::{DefinitionRepository, Rule};

use crate::builtin::{
    kinds, CircularDefinitionRule, DuplicateDefinitionRule, LengthBoundsRule,
    OntologicalCategoryRule, PatternMode, PatternRule,
};

/// Builds a rule implementation from its definition.
pub type RuleFactory =
    Arc<dyn Fn(&RuleDefinition) -> Result<Box<dyn Rule>, ConfigError> + Send + Sync>;

/// Collaborators the built-in kinds may need.
#[derive(Clone, Default)]
pub struct BuiltinDeps {
    /// Needed by `duplicate_definition`; without it that kind fails to build.
    pub repository: Option<Arc<dyn DefinitionRepository>>,
    /// TTL and capacity for the per-begrip pattern cache.
    pub cache: CacheConfig,
}

/// Registered rule kinds. Rule files name a kind; they never carry code.
#[derive(Clone, Default)]
pub struct RuleCatalog {
    factories: HashMap<String, RuleFactory>,
}

impl RuleCatalog {
    /// A catalog with no kinds registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A catalog with every built-in kind registered.
    pub fn builtin(deps: BuiltinDeps) -> Self {
        let mut catalog = Self::empty();

        catalog.register(kinds::FORBIDDEN_PATTERN, |def| {
            Ok(Box::new(PatternRule::from_definition(def, PatternMode::Forbidden)?))
        });
        catalog.register(kinds::REQUIRED_PATTERN, |def| {
            Ok(Box::new(PatternRule::from_definition(def, PatternMode::Required)?))
        });
        catalog.register(kinds::LENGTH_BOUNDS, |def| {
            Ok(Box::new(LengthBoundsRule::from_definition(def)?))
        });
        catalog.register(kinds::ONTOLOGICAL_CATEGORY, |def| {
            Ok(Box::new(OntologicalCategoryRule::from_definition(def)?))
        });

        // One pattern cache shared by every circular-definition rule.
        let patterns = Arc::new(
            MemoCache::builder("begrip_patterns")
                .time_to_live(Duration::from_secs(deps.cache.effective_ttl_seconds()))
                .max_capacity(deps.cache.effective_max_entries())
                .build(),
        );
        catalog.register(kinds::CIRCULAR_DEFINITION, move |def| {
            Ok(Box::new(CircularDefinitionRule::from_definition(
                def,
                Arc::clone(&patterns),
            )?))
        });

        let repository = deps.repository;
        catalog.register(kinds::DUPLICATE_DEFINITION, move |def| {
            let repository = repository.clone().ok_or_else(|| ConfigError::ValidationFailed {
                field: format!("{}.kind", def.id),
                message: "duplicate_definition needs a definition repository".to_string(),
            })?;
            Ok(Box::new(DuplicateDefinitionRule::from_definition(def, repository)?))
        });

        catalog
    }

    /// Register (or replace) the factory for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&RuleDefinition) -> Result<Box<dyn Rule>, ConfigError> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build the implementation for `definition`. An unknown kind is a
    /// validation failure on the definition.
    pub fn build(&self, definition: &RuleDefinition) -> Result<Box<dyn Rule>, ConfigError> {
        let factory =
            self.factories
                .get(&definition.kind)
                .ok_or_else(|| ConfigError::ValidationFailed {
                    field: format!("{}.kind", definition.id),
                    message: format!("unknown rule kind '{}'", definition.kind),
                })?;
        factory(definition)
    }
}

impl std::fmt::Debug for RuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleCatalog")
            .field("kinds", &self.kinds())
            .finish()
    }
}
