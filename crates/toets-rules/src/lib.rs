//! # toets-rules
//!
//! Everything between rule configuration and a `RuleResult`:
//!
//! - **Sources** read rule definition records (directory, inline, static).
//! - **Catalog** maps a definition's `kind` to a registered `Rule`
//!   implementation; rule files carry data only.
//! - **Built-in kinds**: forbidden/required pattern, circular definition,
//!   length bounds, duplicate definition, ontological category.
//! - **Registry** loads lazily once through the memo cache, skipping
//!   malformed records, and lists enabled rules in (category, id) order.
//! - **Evaluator** runs one rule against one context and never fails.

pub mod builtin;
pub mod catalog;
pub mod evaluator;
pub mod registry;
pub mod repository;
pub mod source;

pub use catalog::{BuiltinDeps, RuleCatalog};
pub use evaluator::RuleEvaluator;
pub use registry::{LoadedRule, RuleRegistry, RuleSet};
pub use repository::InMemoryDefinitionRepository;
pub use source::{DirectorySource, InlineSource, RuleSource, SourceRecord, StaticSource};
