//! # Cache Capability Traits
//!
//! The capability set a TTL cache exposes to its host process, plus the
//! thread-safety marker. Hosts program against [`Cache`] so the concrete
//! engine stays a composition-root decision.
//!
//! | Trait             | Purpose                                   |
//! |-------------------|-------------------------------------------|
//! | `Cache`           | Lookup, timed insert, touch, size, stats  |
//! | `ConcurrentCache` | Marker: safe to share across threads      |
//!
//! Absence is always explicit: `get` returns `Option<Arc<V>>`, never a
//! default value, so a legitimately stored zero/empty value is
//! distinguishable from a miss.

use std::sync::Arc;
use std::time::Duration;

/// Operations a TTL + LRU cache offers its host.
///
/// Implementations take `&self` on every method: the engine behind the
/// trait is internally synchronized and shared by handle.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use ttlkit::policy::ttl_lru::ConcurrentTtlCache;
/// use ttlkit::traits::Cache;
///
/// fn warm<C: Cache<u64, String>>(cache: &C, data: &[(u64, &str)]) {
///     for (key, value) in data {
///         cache.insert(*key, value.to_string(), Duration::from_secs(60));
///     }
/// }
///
/// let cache: ConcurrentTtlCache<u64, String> =
///     ConcurrentTtlCache::with_thresholds(8.0, 12.0).unwrap();
/// warm(&cache, &[(1, "one"), (2, "two")]);
/// assert_eq!(cache.len(), 2);
/// ```
pub trait Cache<K, V> {
    /// Inserts or updates an entry with the given time-to-live, returning
    /// the previous value on update. Never blocks on eviction work.
    fn insert(&self, key: K, value: V, ttl: Duration) -> Option<Arc<V>>;

    /// Looks a key up. A live entry counts as a hit and becomes most
    /// recently used; an absent or expired key counts as a miss and yields
    /// `None`.
    fn get(&self, key: &K) -> Option<Arc<V>>;

    /// Marks an entry as recently used without reading it. Silent no-op
    /// (returning `false`) when absent; no hit/miss effect.
    fn touch(&self, key: &K) -> bool;

    /// Point-in-time entry count; may be stale under concurrent mutation.
    fn len(&self) -> usize;

    /// `true` when [`len`](Self::len) observes zero entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fraction of lookups that hit; `0.0` before any lookup.
    fn hit_rate(&self) -> f64;
}

/// Marker trait for caches that are safe to use concurrently.
///
/// Implementors guarantee thread-safe operations. Use it as a bound when a
/// function hands the cache to multiple threads:
///
/// ```
/// use ttlkit::traits::{Cache, ConcurrentCache};
///
/// fn share_across_threads<K, V, C>(_cache: &C)
/// where
///     C: Cache<K, V> + ConcurrentCache,
/// {
///     // safe to hand clones to worker threads
/// }
/// ```
pub trait ConcurrentCache: Send + Sync {}
