//! MemoCache: `get_or_compute` with per-key stampede protection.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use moka::notification::RemovalCause;
use moka::sync::Cache;
use tracing::debug;

use crate::listener::{InvalidationCause, ListenerSet};
use crate::stats::{CacheStats, CacheStatsSnapshot};

type KeyLock = Arc<Mutex<()>>;

/// Concurrent memoization cache.
///
/// Lookup of a present entry never touches a lock. On a miss the caller
/// takes a lock scoped to that key, re-checks, computes, stores, and
/// releases. The lock table is a sharded `DashMap`, so unrelated keys do
/// not contend.
///
/// An invalidation that lands while a computation is in flight wins: the
/// computed value is returned to its caller but not kept.
pub struct MemoCache<K, V> {
    name: String,
    entries: Cache<K, V>,
    inflight: DashMap<K, KeyLock>,
    /// Bumped by every invalidation.
    epoch: AtomicU64,
    listeners: Arc<ListenerSet<K>>,
    stats: CacheStats,
}

/// Builder for [`MemoCache`].
pub struct MemoCacheBuilder<K, V> {
    name: String,
    time_to_live: Option<Duration>,
    max_capacity: Option<u64>,
    _marker: std::marker::PhantomData<fn(K) -> V>,
}

impl<K, V> MemoCacheBuilder<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Entries expire this long after insertion.
    pub fn time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    /// Bound the number of entries.
    pub fn max_capacity(mut self, max_entries: u64) -> Self {
        self.max_capacity = Some(max_entries);
        self
    }

    pub fn build(self) -> MemoCache<K, V> {
        let listeners: Arc<ListenerSet<K>> = Arc::new(ListenerSet::new());
        let hook = Arc::clone(&listeners);
        let hook_name = self.name.clone();

        // Explicit removals are reported by `invalidate` itself.
        let mut builder = Cache::builder().eviction_listener(
            move |key: Arc<K>, _value: V, cause: RemovalCause| {
                let cause = match cause {
                    RemovalCause::Expired => InvalidationCause::Expired,
                    RemovalCause::Size => InvalidationCause::Evicted,
                    _ => return,
                };
                hook.notify(&hook_name, &key, cause);
            },
        );
        if let Some(ttl) = self.time_to_live {
            builder = builder.time_to_live(ttl);
        }
        if let Some(max) = self.max_capacity {
            builder = builder.max_capacity(max);
        }

        MemoCache {
            name: self.name,
            entries: builder.build(),
            inflight: DashMap::new(),
            epoch: AtomicU64::new(0),
            listeners,
            stats: CacheStats::default(),
        }
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Start building a cache. `name` appears in log lines.
    pub fn builder(name: impl Into<String>) -> MemoCacheBuilder<K, V> {
        MemoCacheBuilder {
            name: name.into(),
            time_to_live: None,
            max_capacity: None,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a value without computing.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key)
    }

    /// Return the cached value for `key`, or run `compute` to produce it.
    ///
    /// At most one `compute` runs per key at a time; concurrent callers for
    /// the same key wait and receive the stored value. An `Err` is returned
    /// to the caller that computed it and is not stored, so the next caller
    /// computes again.
    pub fn get_or_compute<E, F>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.entries.get(&key) {
            self.stats.hit();
            return Ok(value);
        }
        self.stats.miss();

        let lock = self.key_lock(&key);
        let outcome = {
            // The guarded data is `()`, so a poisoned lock carries no broken
            // state; the double-check below still decides what happens.
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            let epoch = self.epoch.load(Ordering::SeqCst);

            if let Some(value) = self.entries.get(&key) {
                self.stats.coalesced();
                Ok(value)
            } else {
                self.stats.computation();
                debug!(cache = %self.name, "computing entry");
                match compute() {
                    Ok(value) => {
                        self.entries.insert(key.clone(), value.clone());
                        // Checked after the insert: an invalidation that bumps
                        // the epoch later also removes what was just stored.
                        if self.epoch.load(Ordering::SeqCst) != epoch {
                            self.entries.invalidate(&key);
                            debug!(cache = %self.name, "invalidated during computation; value not kept");
                        }
                        Ok(value)
                    }
                    Err(e) => {
                        self.stats.failure();
                        debug!(cache = %self.name, "computation failed; nothing stored");
                        Err(e)
                    }
                }
            }
        };
        self.release_key_lock(&key, &lock);
        outcome
    }

    /// Infallible form of [`get_or_compute`](Self::get_or_compute).
    pub fn get_or_insert_with<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        match self.get_or_compute::<std::convert::Infallible, _>(key, || Ok(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Store a value directly, replacing any existing entry.
    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    /// Remove one entry. Listeners are told only if an entry was present.
    /// A computation in flight at this moment will not store its result.
    pub fn invalidate(&self, key: &K) -> bool {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        match self.entries.remove(key) {
            Some(_) => {
                self.listeners
                    .notify(&self.name, key, InvalidationCause::Explicit);
                true
            }
            None => false,
        }
    }

    /// Remove every entry, notifying listeners per key. Returns the number
    /// of entries removed.
    pub fn invalidate_all(&self) -> usize {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let keys: Vec<K> = self.entries.iter().map(|(k, _)| (*k).clone()).collect();
        keys.iter().filter(|k| self.invalidate(k)).count()
    }

    /// Register a callback for entries leaving the cache.
    pub fn on_invalidate<F>(&self, listener: F)
    where
        F: Fn(&K, InvalidationCause) + Send + Sync + 'static,
    {
        self.listeners.register(Arc::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of live entries, after flushing pending maintenance.
    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    /// Flush pending expirations and evictions (and their notifications).
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of keys with a computation in flight or waiters queued.
    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }

    fn key_lock(&self, key: &K) -> KeyLock {
        self.inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Drop the key's lock from the table unless someone else still holds
    /// or waits on it. Clones are only taken under the shard lock that
    /// `remove_if` also takes, so the count check cannot race.
    fn release_key_lock(&self, key: &K, lock: &KeyLock) {
        self.inflight.remove_if(key, |_, held| {
            Arc::ptr_eq(held, lock) && Arc::strong_count(held) <= 2
        });
    }
}
