//! # toets-core
//!
//! Foundation crate for the Toets definition-validation engine.
//! Defines the evaluation context, data model, error taxonomy, config,
//! collaborator traits, and tracing setup. Every other crate in the
//! workspace depends on this.

pub mod config;
pub mod constants;
pub mod context;
pub mod errors;
pub mod models;
pub mod traits;
pub mod tracing;

// Re-export the most commonly used types at the crate root.
pub use config::ToetsConfig;
pub use context::{EvaluationContext, EvaluationContextBuilder};
pub use errors::{
    ConcurrencyError, ConfigError, DependencyError, RegistryError, RuleError, ServiceError,
    ToetsErrorCode,
};
pub use models::{RuleDefinition, RuleResult, RuleStatus, Severity, ValidationResult, Violation};
