//! Invalidation listeners.

use std::sync::{Arc, PoisonError, RwLock};

/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidationCause {
    /// `invalidate` / `invalidate_all` was called.
    Explicit,
    /// The entry outlived its TTL.
    Expired,
    /// The entry was dropped to respect the capacity bound.
    Evicted,
}

pub(crate) type Listener<K> = Arc<dyn Fn(&K, InvalidationCause) + Send + Sync>;

/// Registered listeners, shared with the storage eviction hook.
pub(crate) struct ListenerSet<K> {
    listeners: RwLock<Vec<Listener<K>>>,
}

impl<K> ListenerSet<K> {
    pub(crate) fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn register(&self, listener: Listener<K>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Call every listener. A panicking listener is logged and does not
    /// prevent later listeners from running.
    pub(crate) fn notify(&self, cache: &str, key: &K, cause: InvalidationCause) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener(key, cause);
            }));
            if result.is_err() {
                tracing::warn!(cache, ?cause, "invalidation listener panicked");
            }
        }
    }
}
