//! # TTL + LRU Cache
//!
//! A key-value cache combining per-entry time-to-live expiry with
//! least-recently-used ordering, plus a concurrent engine that reclaims
//! entries in the background once the cache grows past a hysteresis band.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                     ConcurrentTtlCache<K, V>                     │
//!   │                                                                  │
//!   │   ┌───────────────────────────────┐  ┌────────────────────────┐  │
//!   │   │  Mutex<EngineState> (cache    │  │ Mutex<()> (sweep lock) │  │
//!   │   │  lock)                        │  │ AtomicBool (in-flight) │  │
//!   │   │   ├── TtlLruCore<K, V>        │  │ AtomicU64  (sweeps)    │  │
//!   │   │   ├── Hysteresis gate         │  └────────────────────────┘  │
//!   │   │   └── eviction listeners      │                              │
//!   │   └───────────────────────────────┘                              │
//!   └──────────────────────────────────────────────────────────────────┘
//!
//!   TtlLruCore<K, V>
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │  FxHashMap<K, NonNull<Node>>   (index)                           │
//!   │                                                                  │
//!   │  head ──► ┌──────┐ ◄──► ┌──────┐ ◄──► ┌──────┐ ◄── tail          │
//!   │    (MRU)  │ Node │      │ Node │      │ Node │   (LRU)           │
//!   │           └──────┘      └──────┘      └──────┘                   │
//!   │           key, Arc<V>, expires_at per node                       │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Components
//!
//! | Component               | Description                                      |
//! |-------------------------|--------------------------------------------------|
//! | `TtlLruCore<K, V>`      | Single-threaded core: index + recency list + TTL |
//! | `ConcurrentTtlCache`    | Thread-safe engine with background reclamation   |
//! | `Node<K, V>`            | List node storing key, `Arc<V>`, expiry instant  |
//! | `Lookup<K, V>`          | Three-way read outcome (hit / miss / expired)    |
//!
//! ## Read path
//!
//! ```text
//!   get(k)
//!     ├── absent                     → miss counter, Lookup::Miss
//!     ├── present, expires_at <= now → detach from index + list,
//!     │                                miss counter, Lookup::Expired{k, v}
//!     └── present, live              → hit counter, move to MRU,
//!                                      Lookup::Hit(v)
//! ```
//!
//! Expiry is lazy: entries are never scanned proactively, they are discovered
//! expired on read or while a sweep pops them.
//!
//! ## Write path and reclamation
//!
//! Every insert feeds the post-insert entry count to the hysteresis gate.
//! When the gate's sticky state and its instantaneous above-upper flag are
//! both set and no sweep is in flight, the engine marks a sweep in flight and
//! spawns a detached background thread. The sweep repeatedly pops the
//! least-recently-used entry, re-checking the gate after each removal, until
//! the sticky state clears at the lower edge of the band. Insert never waits
//! for the sweep.
//!
//! ## Concurrency Model
//!
//! Two mutual-exclusion domains:
//!
//! - **Cache lock** (`Mutex<EngineState>`): serializes every index/list
//!   mutation and read, including each individual removal inside a sweep.
//!   Held briefly per operation, never across a blocking wait.
//! - **Sweep lock** (`Mutex<()>`): serializes sweep bodies so two sweeps
//!   never interleave removal decisions. Only the background task takes it;
//!   foreground callers are gated by the in-flight flag instead and never
//!   block on a running sweep.
//!
//! LRU order is consistent at each cache-lock release point. Whether the
//! entry a triggering insert just added survives the sweep is unspecified.
//!
//! ## Eviction notifications
//!
//! Listeners registered with `on_eviction` run synchronously in registration
//! order, once per swept or lazily-expired entry, after the entry is fully
//! detached, while the cache lock is held. A listener must not call back
//! into the cache (reentrancy deadlocks on the cache lock). A panicking
//! listener aborts the remainder of that sweep; the in-flight flag is still
//! cleared by a drop guard, so a later insert can trigger a fresh sweep.
//!
//! ## Thread Safety
//!
//! - `TtlLruCore`: **NOT thread-safe**, single-threaded only.
//! - `ConcurrentTtlCache`: thread-safe via `parking_lot::Mutex`; the handle
//!   is cheaply clonable and all methods take `&self`.

use std::fmt;
use std::hash::Hash;
use std::ptr::NonNull;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "concurrency")]
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
#[cfg(feature = "concurrency")]
use std::thread;

#[cfg(feature = "concurrency")]
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

#[cfg(feature = "concurrency")]
use crate::config::CacheConfig;
#[cfg(feature = "concurrency")]
use crate::error::ConfigError;
use crate::error::InvariantError;
#[cfg(feature = "concurrency")]
use crate::hysteresis::Hysteresis;
use crate::metrics::metrics_impl::TtlLruMetrics;
use crate::metrics::snapshot::TtlLruMetricsSnapshot;
use crate::metrics::traits::{
    CoreMetricsRecorder, MetricsSnapshotProvider, TtlLruMetricsReadRecorder, TtlLruMetricsRecorder,
};
#[cfg(feature = "concurrency")]
use crate::traits::{Cache, ConcurrentCache};

/// Node in the recency list.
///
/// The key is duplicated here so eviction can remove the index entry from a
/// tail pop alone.
struct Node<K, V> {
    prev: Option<NonNull<Node<K, V>>>,
    next: Option<NonNull<Node<K, V>>>,
    key: K,
    value: Arc<V>,
    expires_at: Instant,
}

impl<K, V> Node<K, V> {
    #[inline]
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Outcome of a [`TtlLruCore::get`] lookup.
///
/// An expired entry is reported with its detached key and value so the
/// caller can fire eviction notifications; by the time the variant is
/// returned the entry is already gone from both index and list.
#[derive(Debug)]
pub enum Lookup<K, V> {
    /// Key present and live; the entry has been moved to the MRU position.
    Hit(Arc<V>),
    /// Key absent.
    Miss,
    /// Key present but past its expiry; the entry has been removed.
    Expired { key: K, value: Arc<V> },
}

impl<K, V> Lookup<K, V> {
    /// The value when this lookup hit, `None` otherwise.
    pub fn found(self) -> Option<Arc<V>> {
        match self {
            Lookup::Hit(value) => Some(value),
            _ => None,
        }
    }

    /// `true` for [`Lookup::Hit`].
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }
}

/// Single-threaded TTL + LRU core using a hash index over a raw-pointer
/// linked list.
///
/// Keys live in both the index and the node (`Clone` bound); values are
/// shared as `Arc<V>` so callers can hold them past eviction. All operations
/// are O(1) except `clear` and `check_invariants`.
///
/// There is no fixed capacity: the core grows freely and shrinks through
/// TTL expiry, explicit removal, and [`pop_lru`](Self::pop_lru) — the
/// concurrent engine drives the latter from its hysteresis gate.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use ttlkit::policy::ttl_lru::TtlLruCore;
///
/// let mut cache: TtlLruCore<u64, String> = TtlLruCore::new();
/// cache.insert(1, Arc::new("one".to_string()), Duration::from_secs(60));
///
/// let value = cache.get(&1).found().unwrap();
/// assert_eq!(*value, "one");
/// ```
pub struct TtlLruCore<K, V>
where
    K: Clone + Eq + Hash,
{
    map: FxHashMap<K, NonNull<Node<K, V>>>,
    /// Most recently used end of the list.
    head: Option<NonNull<Node<K, V>>>,
    /// Least recently used end of the list; eviction victim.
    tail: Option<NonNull<Node<K, V>>>,
    metrics: TtlLruMetrics,
}

// SAFETY: the raw pointers only reference heap nodes owned by this struct.
// Values are Arc<V>, so sending the core requires V: Send + Sync.
unsafe impl<K, V> Send for TtlLruCore<K, V>
where
    K: Clone + Eq + Hash + Send,
    V: Send + Sync,
{
}

// SAFETY: shared access alone cannot reach &mut methods; the concurrent
// engine wraps the core in a Mutex for actual cross-thread mutation.
unsafe impl<K, V> Sync for TtlLruCore<K, V>
where
    K: Clone + Eq + Hash + Sync,
    V: Send + Sync,
{
}

impl<K, V> TtlLruCore<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates an empty core.
    #[inline]
    pub fn new() -> Self {
        TtlLruCore {
            map: FxHashMap::default(),
            head: None,
            tail: None,
            metrics: TtlLruMetrics::default(),
        }
    }

    /// Detach a node from the linked list without removing it from the map.
    #[inline(always)]
    fn detach(&mut self, node_ptr: NonNull<Node<K, V>>) {
        unsafe {
            let node = node_ptr.as_ref();
            let prev = node.prev;
            let next = node.next;

            match prev {
                Some(mut p) => p.as_mut().next = next,
                None => self.head = next,
            }

            match next {
                Some(mut n) => n.as_mut().prev = prev,
                None => self.tail = prev,
            }
        }
    }

    /// Attach a node at the front (MRU position).
    #[inline(always)]
    fn attach_front(&mut self, mut node_ptr: NonNull<Node<K, V>>) {
        unsafe {
            let node = node_ptr.as_mut();
            node.prev = None;
            node.next = self.head;

            match self.head {
                Some(mut h) => h.as_mut().prev = Some(node_ptr),
                None => self.tail = Some(node_ptr),
            }

            self.head = Some(node_ptr);
        }
    }

    /// Pop the tail node (LRU) and return it.
    #[inline(always)]
    fn pop_tail(&mut self) -> Option<Box<Node<K, V>>> {
        self.tail.map(|tail_ptr| unsafe {
            let node = Box::from_raw(tail_ptr.as_ptr());

            self.tail = node.prev;
            match self.tail {
                Some(mut t) => t.as_mut().next = None,
                None => self.head = None,
            }

            node
        })
    }

    /// Detach a node from both list and index, reclaiming its allocation.
    #[inline]
    fn unlink(&mut self, node_ptr: NonNull<Node<K, V>>) -> Box<Node<K, V>> {
        self.detach(node_ptr);
        let node = unsafe { Box::from_raw(node_ptr.as_ptr()) };
        self.map.remove(&node.key);
        node
    }

    /// Inserts or updates an entry, returning the previous value on update.
    ///
    /// An update replaces the value, recomputes expiry from `ttl`, and moves
    /// the entry to the MRU position (an update counts as a use). A zero
    /// `ttl` is valid: the entry is born expired and surfaces on first read
    /// or next sweep.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use ttlkit::policy::ttl_lru::TtlLruCore;
    ///
    /// let mut cache: TtlLruCore<u64, &str> = TtlLruCore::new();
    /// assert!(cache.insert(1, Arc::new("first"), Duration::from_secs(60)).is_none());
    ///
    /// let previous = cache.insert(1, Arc::new("second"), Duration::from_secs(60));
    /// assert_eq!(*previous.unwrap(), "first");
    /// assert_eq!(cache.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: Arc<V>, ttl: Duration) -> Option<Arc<V>> {
        self.metrics.record_insert_call();
        let expires_at = Instant::now() + ttl;

        if let Some(&node_ptr) = self.map.get(&key) {
            self.metrics.record_insert_update();

            let previous = unsafe {
                let node = &mut *node_ptr.as_ptr();
                node.expires_at = expires_at;
                std::mem::replace(&mut node.value, value)
            };

            self.detach(node_ptr);
            self.attach_front(node_ptr);

            self.validate_invariants();

            return Some(previous);
        }

        self.metrics.record_insert_new();

        let node = Box::new(Node {
            prev: None,
            next: None,
            key: key.clone(),
            value,
            expires_at,
        });
        let node_ptr = NonNull::new(Box::into_raw(node)).unwrap();

        self.map.insert(key, node_ptr);
        self.attach_front(node_ptr);

        self.validate_invariants();

        None
    }

    /// Looks a key up, reporting one of three outcomes.
    ///
    /// A live entry moves to the MRU position and counts as a hit. An
    /// absent key counts as a miss. An entry past its expiry is removed on
    /// the spot, counts as a miss, and is handed back in
    /// [`Lookup::Expired`] so the caller can notify listeners.
    pub fn get(&mut self, key: &K) -> Lookup<K, V> {
        self.metrics.record_get_call();

        let node_ptr = match self.map.get(key) {
            Some(&ptr) => ptr,
            None => {
                self.metrics.record_get_miss();
                return Lookup::Miss;
            },
        };

        let now = Instant::now();
        if unsafe { node_ptr.as_ref().is_expired(now) } {
            self.metrics.record_get_miss();
            self.metrics.record_expired_removal();

            let node = self.unlink(node_ptr);
            self.validate_invariants();

            let Node { key, value, .. } = *node;
            return Lookup::Expired { key, value };
        }

        self.metrics.record_get_hit();

        self.detach(node_ptr);
        self.attach_front(node_ptr);

        self.validate_invariants();

        unsafe { Lookup::Hit(Arc::clone(&(*node_ptr.as_ptr()).value)) }
    }

    /// Read-only lookup without LRU reordering or hit/miss accounting.
    ///
    /// Returns `None` for an expired entry but leaves it in place (removal
    /// needs `&mut self`; the entry surfaces on the next `get` or sweep).
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.metrics.record_peek_call();

        let &node_ptr = self.map.get(key)?;
        let node = unsafe { node_ptr.as_ref() };
        if node.is_expired(Instant::now()) {
            return None;
        }

        self.metrics.record_peek_found();
        Some(Arc::clone(&node.value))
    }

    /// Marks an entry as recently used without touching value or expiry.
    ///
    /// Returns `false` (a silent no-op, not an error) when the key is
    /// absent. Never counts toward hit/miss statistics.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use ttlkit::policy::ttl_lru::TtlLruCore;
    ///
    /// let mut cache: TtlLruCore<u64, &str> = TtlLruCore::new();
    /// cache.insert(1, Arc::new("first"), Duration::from_secs(60));
    /// cache.insert(2, Arc::new("second"), Duration::from_secs(60));
    ///
    /// // Key 1 is the current eviction victim; touching it shifts that to 2
    /// assert!(cache.touch(&1));
    /// let (victim, _) = cache.pop_lru().unwrap();
    /// assert_eq!(victim, 2);
    ///
    /// assert!(!cache.touch(&99));
    /// ```
    pub fn touch(&mut self, key: &K) -> bool {
        self.metrics.record_touch_call();

        if let Some(&node_ptr) = self.map.get(key) {
            self.detach(node_ptr);
            self.attach_front(node_ptr);

            self.validate_invariants();

            self.metrics.record_touch_found();
            true
        } else {
            false
        }
    }

    /// Removes and returns the least recently used entry.
    ///
    /// Returns `None` on an empty core; the background sweep treats that as
    /// a no-op removal.
    pub fn pop_lru(&mut self) -> Option<(K, Arc<V>)> {
        self.metrics.record_pop_lru_call();

        let node = self.pop_tail()?;
        self.map.remove(&node.key);

        self.validate_invariants();

        self.metrics.record_pop_lru_found();
        self.metrics.record_evicted_entry();

        let Node { key, value, .. } = *node;
        Some((key, value))
    }

    /// Removes a specific entry.
    ///
    /// Explicit removal is neither an eviction nor an expiry, so the engine
    /// fires no notification for it.
    pub fn remove(&mut self, key: &K) -> Option<Arc<V>> {
        let node_ptr = self.map.get(key).copied()?;
        let node = self.unlink(node_ptr);

        self.validate_invariants();

        Some(node.value)
    }

    /// `true` if the key is indexed, with no expiry check or reordering.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Current number of indexed entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// `true` when no entries are indexed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Removes all entries without firing notifications.
    pub fn clear(&mut self) {
        self.metrics.record_clear();

        while self.pop_tail().is_some() {}
        self.map.clear();

        self.validate_invariants();
    }

    /// Fraction of lookups that hit, `0.0` before any lookup.
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        self.metrics.hit_rate()
    }

    /// Verifies the index/list bijection and list integrity.
    ///
    /// Walks the list from the MRU end: every node's key must be indexed,
    /// the walk must terminate without a cycle, and the node count must
    /// equal the index cardinality.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.map.is_empty() {
            if self.head.is_some() || self.tail.is_some() {
                return Err(InvariantError::new("empty index with non-empty list"));
            }
            return Ok(());
        }

        let mut count = 0usize;
        let mut current = self.head;
        let mut last = None;
        while let Some(ptr) = current {
            count += 1;
            if count > self.map.len() {
                return Err(InvariantError::new("cycle detected in recency list"));
            }
            unsafe {
                let node = ptr.as_ref();
                if !self.map.contains_key(&node.key) {
                    return Err(InvariantError::new("list node key missing from index"));
                }
                last = Some(ptr);
                current = node.next;
            }
        }

        if count != self.map.len() {
            return Err(InvariantError::new(format!(
                "index/list length mismatch: index={} list={}",
                self.map.len(),
                count
            )));
        }
        if last != self.tail {
            return Err(InvariantError::new("tail pointer does not end the list"));
        }

        Ok(())
    }

    /// Debug-build invariant assertion after each mutation.
    #[inline]
    fn validate_invariants(&self) {
        #[cfg(debug_assertions)]
        {
            if let Err(err) = self.check_invariants() {
                panic!("{}", err);
            }
        }
    }

    /// Copies the counters plus current gauges.
    pub fn metrics_snapshot(&self) -> TtlLruMetricsSnapshot {
        TtlLruMetricsSnapshot {
            get_calls: self.metrics.get_calls,
            get_hits: self.metrics.get_hits,
            get_misses: self.metrics.get_misses,
            expired_removals: self.metrics.expired_removals,
            insert_calls: self.metrics.insert_calls,
            insert_updates: self.metrics.insert_updates,
            insert_new: self.metrics.insert_new,
            evicted_entries: self.metrics.evicted_entries,
            touch_calls: self.metrics.touch_calls,
            touch_found: self.metrics.touch_found,
            pop_lru_calls: self.metrics.pop_lru_calls,
            pop_lru_found: self.metrics.pop_lru_found,
            clear_calls: self.metrics.clear_calls,
            peek_calls: self.metrics.peek_calls.get(),
            peek_found: self.metrics.peek_found.get(),
            cache_len: self.map.len(),
            sweeps_started: 0,
        }
    }
}

// Free all heap-allocated nodes when the core is dropped.
impl<K, V> Drop for TtlLruCore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn drop(&mut self) {
        while self.pop_tail().is_some() {}
    }
}

impl<K, V> Default for TtlLruCore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for TtlLruCore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlLruCore")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<K, V> MetricsSnapshotProvider<TtlLruMetricsSnapshot> for TtlLruCore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn snapshot(&self) -> TtlLruMetricsSnapshot {
        self.metrics_snapshot()
    }
}

// ---------------------------------------------------------------------------
// Concurrent engine
// ---------------------------------------------------------------------------

/// Callback invoked with the key and value of each evicted or expired entry.
#[cfg(feature = "concurrency")]
pub type EvictionListener<K, V> = Box<dyn Fn(&K, &Arc<V>) + Send>;

/// Everything guarded by the cache lock.
#[cfg(feature = "concurrency")]
struct EngineState<K, V>
where
    K: Clone + Eq + Hash,
{
    core: TtlLruCore<K, V>,
    gate: Hysteresis,
    listeners: Vec<EvictionListener<K, V>>,
}

#[cfg(feature = "concurrency")]
impl<K, V> EngineState<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Runs listeners in registration order. Called only after the entry is
    /// fully detached, with the cache lock held.
    fn notify(&self, key: &K, value: &Arc<V>) {
        for listener in &self.listeners {
            listener(key, value);
        }
    }
}

#[cfg(feature = "concurrency")]
struct Shared<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Cache lock: every index/list mutation and read goes through here.
    state: Mutex<EngineState<K, V>>,
    /// Sweep lock: serializes sweep bodies; never taken by foreground calls.
    sweep_lock: Mutex<()>,
    /// Single-flight flag: at most one sweep scheduled at a time.
    sweep_in_flight: AtomicBool,
    /// Count of sweep-start events, for diagnostics and tests.
    sweeps_started: AtomicU64,
}

/// Clears the in-flight flag when the sweep exits, on every path.
#[cfg(feature = "concurrency")]
struct InFlightGuard<'a>(&'a AtomicBool);

#[cfg(feature = "concurrency")]
impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Thread-safe TTL + LRU cache with hysteresis-controlled background
/// reclamation.
///
/// The handle is a cheap `Clone` over shared state; construct one at the
/// host's composition root and pass clones to whatever subsystems need it.
/// Inserting past the upper edge of the configured band spawns a detached
/// sweep thread that removes least-recently-used entries until the size
/// falls to the lower edge. At most one sweep runs at a time and inserts
/// never wait for it.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use ttlkit::config::CacheConfig;
/// use ttlkit::policy::ttl_lru::ConcurrentTtlCache;
///
/// let cache: ConcurrentTtlCache<u64, String> =
///     ConcurrentTtlCache::from_config(&CacheConfig::new(10.0, 0.2)).unwrap();
///
/// cache.insert(1, "one".to_string(), Duration::from_secs(60));
/// assert_eq!(*cache.get(&1).unwrap(), "one");
/// assert!(cache.get(&2).is_none());
/// assert_eq!(cache.len(), 1);
/// ```
#[cfg(feature = "concurrency")]
pub struct ConcurrentTtlCache<K, V>
where
    K: Clone + Eq + Hash,
{
    inner: Arc<Shared<K, V>>,
}

#[cfg(feature = "concurrency")]
impl<K, V> Clone for ConcurrentTtlCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> fmt::Debug for ConcurrentTtlCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ConcurrentTtlCache")
            .field("len", &state.core.len())
            .field("lower_threshold", &state.gate.lower_threshold())
            .field("upper_threshold", &state.gate.upper_threshold())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentTtlCache<K, V>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: Send + Sync + 'static,
{
    /// Builds an engine from host tuning values, deriving the band
    /// `(item_threshold * (1 - hysteresis), item_threshold * (1 + hysteresis))`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] immediately when the config fails
    /// [`CacheConfig::validate`]; no cache operation is attempted first.
    pub fn from_config(config: &CacheConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_gate(config.gate()?))
    }

    /// Builds an engine over an explicit `(lower, upper)` band.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `lower >= upper` or a bound is
    /// non-finite.
    pub fn with_thresholds(lower: f64, upper: f64) -> Result<Self, ConfigError> {
        Ok(Self::from_gate(Hysteresis::new(lower, upper)?))
    }

    fn from_gate(gate: Hysteresis) -> Self {
        tracing::debug!(
            lower_threshold = gate.lower_threshold(),
            upper_threshold = gate.upper_threshold(),
            "ttl cache constructed"
        );
        Self {
            inner: Arc::new(Shared {
                state: Mutex::new(EngineState {
                    core: TtlLruCore::new(),
                    gate,
                    listeners: Vec::new(),
                }),
                sweep_lock: Mutex::new(()),
                sweep_in_flight: AtomicBool::new(false),
                sweeps_started: AtomicU64::new(0),
            }),
        }
    }

    /// Looks a key up.
    ///
    /// A live entry moves to the MRU position and counts as a hit; an
    /// absent or expired key counts as a miss and returns `None` — never a
    /// default value. An expired entry is removed on the spot and its
    /// eviction notification fires before this returns. All three branches
    /// run under one critical section.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut state = self.inner.state.lock();
        match state.core.get(key) {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss => None,
            Lookup::Expired { key, value } => {
                state.notify(&key, &value);
                None
            },
        }
    }

    /// Inserts or updates an entry, returning the previous value on update.
    ///
    /// Runs the write path atomically under the cache lock: update-or-append
    /// at the MRU position, feed the new entry count to the hysteresis gate,
    /// and — when the gate reports above the band and no sweep is in
    /// flight — mark one in flight and spawn it. Returns without waiting
    /// for any eviction work.
    ///
    /// A zero `ttl` is valid; the entry is immediately expired and will be
    /// dropped on first read or next sweep.
    pub fn insert(&self, key: K, value: V, ttl: Duration) -> Option<Arc<V>> {
        self.insert_arc(key, Arc::new(value), ttl)
    }

    /// [`insert`](Self::insert) for a value that is already `Arc`-wrapped.
    pub fn insert_arc(&self, key: K, value: Arc<V>, ttl: Duration) -> Option<Arc<V>> {
        let mut state = self.inner.state.lock();
        let previous = state.core.insert(key, value, ttl);

        let len = state.core.len();
        state.gate.check(len as f64);

        if state.gate.state()
            && state.gate.above_upper_threshold()
            && !self.inner.sweep_in_flight.swap(true, Ordering::AcqRel)
        {
            self.inner.sweeps_started.fetch_add(1, Ordering::Relaxed);
            self.spawn_sweep(len);
        }

        previous
    }

    /// Marks an entry as recently used without reading it.
    ///
    /// No-op returning `false` when absent; no hit/miss effect either way.
    pub fn touch(&self, key: &K) -> bool {
        self.inner.state.lock().core.touch(key)
    }

    /// Read-only lookup: no reordering, no hit/miss accounting, `None` for
    /// expired entries (which stay in place until read or swept).
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.inner.state.lock().core.peek(key)
    }

    /// Removes a specific entry. Fires no eviction notification: explicit
    /// removal is neither an eviction nor an expiry.
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        self.inner.state.lock().core.remove(key)
    }

    /// `true` if the key is indexed (expired entries included until they
    /// are read or swept).
    pub fn contains(&self, key: &K) -> bool {
        self.inner.state.lock().core.contains(key)
    }

    /// Point-in-time entry count.
    ///
    /// May be stale immediately after return when other callers or a sweep
    /// mutate concurrently; that race is accepted and documented, not a bug.
    pub fn len(&self) -> usize {
        self.inner.state.lock().core.len()
    }

    /// `true` when [`len`](Self::len) observes zero entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all entries without firing notifications. The gate keeps its
    /// sticky state until the next observation.
    pub fn clear(&self) {
        self.inner.state.lock().core.clear();
    }

    /// Fraction of lookups that hit, from the process-lifetime counters.
    ///
    /// The `0/0` case is defined as `0.0` rather than NaN so callers need
    /// no guard before any lookup has happened.
    pub fn hit_rate(&self) -> f64 {
        self.inner.state.lock().core.hit_rate()
    }

    /// The configured `(lower, upper)` eviction band.
    pub fn thresholds(&self) -> (f64, f64) {
        let state = self.inner.state.lock();
        (
            state.gate.lower_threshold(),
            state.gate.upper_threshold(),
        )
    }

    /// Registers an eviction listener.
    ///
    /// Listeners run synchronously in registration order, once per swept or
    /// lazily-expired entry, after the entry is detached from index and
    /// list, while the cache lock is held. The evicted entry is no longer
    /// observable through [`get`](Self::get) at that point.
    ///
    /// Two caller obligations, both documented rather than enforced:
    /// a listener must not call back into this cache (the cache lock is not
    /// reentrant), and a panicking listener aborts the remainder of the
    /// sweep that invoked it — the cache stays usable and over-size until
    /// the next trigger.
    pub fn on_eviction<F>(&self, listener: F)
    where
        F: Fn(&K, &Arc<V>) + Send + 'static,
    {
        self.inner.state.lock().listeners.push(Box::new(listener));
    }

    /// Core counters plus the engine's sweep-start count.
    pub fn metrics_snapshot(&self) -> TtlLruMetricsSnapshot {
        let mut snapshot = self.inner.state.lock().core.metrics_snapshot();
        snapshot.sweeps_started = self.inner.sweeps_started.load(Ordering::Relaxed);
        snapshot
    }

    /// Spawns the detached sweep thread. The in-flight flag is already set;
    /// if the spawn itself fails the flag is put back so a later insert can
    /// retry.
    fn spawn_sweep(&self, observed_len: usize) {
        let shared = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("ttlkit-sweep".into())
            .spawn(move || run_sweep(&shared));

        match spawned {
            Ok(_) => {
                tracing::debug!(size = observed_len, "eviction sweep scheduled");
            },
            Err(error) => {
                self.inner.sweep_in_flight.store(false, Ordering::Release);
                tracing::warn!(%error, "failed to spawn eviction sweep thread");
            },
        }
    }
}

/// Sweep body: runs on the dedicated background thread.
///
/// Holds the sweep lock for the whole body so two sweeps never interleave,
/// but re-acquires the cache lock per removal so foreground operations slot
/// in between. The loop pops the LRU entry and re-checks the gate with the
/// new size until the sticky state clears at the lower edge of the band —
/// not at the upper edge, which is the hysteresis doing its job.
#[cfg(feature = "concurrency")]
fn run_sweep<K, V>(shared: &Shared<K, V>)
where
    K: Clone + Eq + Hash,
{
    let _sweep = shared.sweep_lock.lock();
    // Cleared on drop, so a panicking listener cannot leave eviction
    // permanently disabled.
    let _in_flight = InFlightGuard(&shared.sweep_in_flight);

    tracing::debug!("eviction sweep started");

    let mut evicted = 0u64;
    loop {
        let mut state = shared.state.lock();
        if !state.gate.state() {
            break;
        }

        match state.core.pop_lru() {
            Some((key, value)) => {
                let len = state.core.len();
                state.gate.check(len as f64);
                state.notify(&key, &value);
                evicted += 1;
            },
            None => {
                // Drained by concurrent reads/expiries: nothing left to
                // remove, re-observe and stop.
                state.gate.check(0.0);
                break;
            },
        }
    }

    tracing::debug!(evicted, "eviction sweep finished");
}

#[cfg(feature = "concurrency")]
impl<K, V> Cache<K, V> for ConcurrentTtlCache<K, V>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: Send + Sync + 'static,
{
    fn insert(&self, key: K, value: V, ttl: Duration) -> Option<Arc<V>> {
        ConcurrentTtlCache::insert(self, key, value, ttl)
    }

    fn get(&self, key: &K) -> Option<Arc<V>> {
        ConcurrentTtlCache::get(self, key)
    }

    fn touch(&self, key: &K) -> bool {
        ConcurrentTtlCache::touch(self, key)
    }

    fn len(&self) -> usize {
        ConcurrentTtlCache::len(self)
    }

    fn hit_rate(&self) -> f64 {
        ConcurrentTtlCache::hit_rate(self)
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentCache for ConcurrentTtlCache<K, V>
where
    K: Clone + Eq + Hash + Send,
    V: Send + Sync,
{
}

#[cfg(feature = "concurrency")]
impl<K, V> MetricsSnapshotProvider<TtlLruMetricsSnapshot> for ConcurrentTtlCache<K, V>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: Send + Sync + 'static,
{
    fn snapshot(&self) -> TtlLruMetricsSnapshot {
        self.metrics_snapshot()
    }
}
