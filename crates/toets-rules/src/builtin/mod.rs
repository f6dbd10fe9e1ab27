//! Built-in rule kinds. Wording and thresholds come from each rule's
//! parameters; the implementations are content-free.

mod circular;
mod duplicate;
mod length;
mod ontology;
mod pattern;

pub use circular::CircularDefinitionRule;
pub use duplicate::DuplicateDefinitionRule;
pub use length::LengthBoundsRule;
pub use ontology::OntologicalCategoryRule;
pub use pattern::{PatternMode, PatternRule, TextTarget};

/// Kind names as they appear in rule files.
pub mod kinds {
    pub const FORBIDDEN_PATTERN: &str = "forbidden_pattern";
    pub const REQUIRED_PATTERN: &str = "required_pattern";
    pub const CIRCULAR_DEFINITION: &str = "circular_definition";
    pub const LENGTH_BOUNDS: &str = "length_bounds";
    pub const DUPLICATE_DEFINITION: &str = "duplicate_definition";
    pub const ONTOLOGICAL_CATEGORY: &str = "ontological_category";
}

use toets_core::errors::ConfigError;
use toets_core::models::RuleDefinition;

pub(crate) fn invalid_parameter(
    definition: &RuleDefinition,
    key: &str,
    message: impl Into<String>,
) -> ConfigError {
    ConfigError::ValidationFailed {
        field: format!("{}.parameters.{}", definition.id, key),
        message: message.into(),
    }
}
