//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::LOG_ENV_VAR;

static INIT: Once = Once::new();

/// Initialize logging for the engine.
///
/// Reads `TOETS_LOG` for per-crate levels, e.g.
/// `TOETS_LOG=toets_cache=debug,toets_engine=info`.
/// Falls back to `toets=info` if unset or invalid.
///
/// Idempotent: only the first call installs a subscriber.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("toets=info"));
    install(filter);
}

/// Initialize with an explicit filter string (for embedding and tests).
pub fn init_tracing_with_filter(filter: &str) {
    install(EnvFilter::new(filter));
}

fn install(filter: EnvFilter) {
    INIT.call_once(|| {
        let installed = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
        // A host application may already own the global subscriber.
        if let Err(e) = installed {
            ::tracing::debug!(error = %e, "global subscriber already set; keeping it");
        }
    });
}
