pub mod rule_definition;
pub mod rule_result;
pub mod severity;
pub mod validation_result;

pub use rule_definition::RuleDefinition;
pub use rule_result::{clip_score, RuleResult, RuleStatus, TextSpan};
pub use severity::Severity;
pub use validation_result::{SystemInfo, ValidationResult, Violation};
