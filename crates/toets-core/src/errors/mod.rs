//! Error handling for Toets.
//! One error enum per concern, `thiserror` only, zero `anyhow`.

pub mod concurrency_error;
pub mod config_error;
pub mod dependency_error;
pub mod error_code;
pub mod registry_error;
pub mod rule_error;
pub mod service_error;

pub use concurrency_error::ConcurrencyError;
pub use config_error::ConfigError;
pub use dependency_error::DependencyError;
pub use error_code::ToetsErrorCode;
pub use registry_error::RegistryError;
pub use rule_error::RuleError;
pub use service_error::ServiceError;
