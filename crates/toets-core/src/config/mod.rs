//! Configuration system for Toets.
//! TOML-based, 5-layer resolution: CLI > env > project > user > defaults.

pub mod batch_config;
pub mod cache_config;
pub mod registry_config;
pub mod scoring_config;
pub mod toets_config;

pub use batch_config::BatchConfig;
pub use cache_config::CacheConfig;
pub use registry_config::RegistryConfig;
pub use scoring_config::{EmptyCategoryPolicy, ScoringConfig};
pub use toets_config::{CliOverrides, ToetsConfig};
