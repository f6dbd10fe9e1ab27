//! In-memory `DefinitionRepository`.

use std::sync::RwLock;

use toets_core::context::EvaluationContext;
use toets_core::errors::DependencyError;
use toets_core::traits::DefinitionRepository;

/// Definitions held in process memory. Begrip comparison is trimmed and
/// case-insensitive.
#[derive(Debug, Default)]
pub struct InMemoryDefinitionRepository {
    /// Normalized begrip of every stored definition.
    definitions: RwLock<Vec<String>>,
}

impl InMemoryDefinitionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one existing definition of `begrip`. A poisoned lock is
    /// recovered; the vector holds no invariant a panicking writer could break.
    pub fn add(&self, begrip: impl AsRef<str>) {
        let mut definitions = self
            .definitions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        definitions.push(begrip.as_ref().trim().to_lowercase());
    }

    pub fn len(&self) -> usize {
        self.definitions
            .read()
            .map(|d| d.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DefinitionRepository for InMemoryDefinitionRepository {
    fn count_matches(&self, begrip: &str, _ctx: &EvaluationContext) -> Result<usize, DependencyError> {
        let key = begrip.trim().to_lowercase();
        let definitions = self
            .definitions
            .read()
            .map_err(|_| DependencyError::unavailable("in_memory_definitions", "lock poisoned"))?;
        Ok(definitions.iter().filter(|b| **b == key).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_normalized_begrip() {
        let repo = InMemoryDefinitionRepository::new();
        repo.add(" Fiets ");
        repo.add("fiets");
        repo.add("auto");

        let ctx = EvaluationContext::new("FIETS", "x");
        assert_eq!(repo.count_matches("FIETS", &ctx).unwrap(), 2);
        assert_eq!(repo.count_matches("boom", &ctx).unwrap(), 0);
        assert_eq!(repo.len(), 3);
    }
}
