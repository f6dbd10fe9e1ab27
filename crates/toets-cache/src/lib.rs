//! # toets-cache
//!
//! Generic memoization for expensive, pure results.
//!
//! - Hits are served from a concurrent `moka` cache without taking any lock.
//! - Misses serialize per key through a sharded lock table (`DashMap`), with
//!   a double-check after the lock is acquired, so concurrent callers for
//!   one key trigger exactly one computation.
//! - Failed computations are never stored; the next caller retries.
//! - Entries may expire (TTL) or be evicted (capacity); listeners are told
//!   about expiry, eviction, and explicit invalidation.

pub mod listener;
pub mod memo;
pub mod stats;

pub use listener::InvalidationCause;
pub use memo::{MemoCache, MemoCacheBuilder};
pub use stats::CacheStatsSnapshot;
