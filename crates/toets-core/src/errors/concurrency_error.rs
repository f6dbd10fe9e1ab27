//! Concurrency errors.

use super::error_code::{self, ToetsErrorCode};

/// Unexpected lock or scheduling failure. Treated as a programming defect:
/// logged at error level and the only category that propagates to callers
/// as a fault.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConcurrencyError {
    #[error("Worker pool could not be built: {message}")]
    PoolBuild { message: String },

    #[error("Worker for {operation} exited without reporting a result")]
    WorkerLost { operation: String },

    #[error("Lock on {resource} is poisoned")]
    LockPoisoned { resource: String },
}

impl ToetsErrorCode for ConcurrencyError {
    fn error_code(&self) -> &'static str {
        error_code::CONCURRENCY_ERROR
    }
}
