pub mod repository;
pub mod rule;

pub use repository::DefinitionRepository;
pub use rule::{Rule, RuleOutcome};
