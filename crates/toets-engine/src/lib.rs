//! # toets-engine
//!
//! The validation service: runs every enabled rule against an immutable
//! `EvaluationContext`, aggregates weighted scores per category, and
//! validates batches on a bounded rayon pool with positional results.

pub mod scoring;
pub mod service;

pub use scoring::{ScoreSummary, ScoringAggregator, ScoringPolicy};
pub use service::ValidationService;
