//! Recorder and snapshot traits for cache metrics.
//!
//! Recording, snapshotting, and read-path counters are kept in separate
//! traits so policy code depends only on the counters it writes:
//!
//! ```text
//!   ┌──────────────────────────────┐
//!   │     CoreMetricsRecorder      │   get/insert/evict/clear counters
//!   └──────────────┬───────────────┘
//!                  │
//!                  ▼
//!   ┌──────────────────────────────┐
//!   │    TtlLruMetricsRecorder     │   expiry/touch/pop_lru counters
//!   └──────────────────────────────┘
//!
//!   Read path (&self, cell-backed):   TtlLruMetricsReadRecorder
//!   Consumption (bench/test):         MetricsSnapshotProvider<S>
//! ```

/// Common counters for any cache policy.
pub trait CoreMetricsRecorder {
    fn record_get_call(&mut self);
    fn record_get_hit(&mut self);
    fn record_get_miss(&mut self);
    fn record_insert_call(&mut self);
    fn record_insert_new(&mut self);
    fn record_insert_update(&mut self);
    fn record_evicted_entry(&mut self);
    fn record_clear(&mut self);
}

/// Counters specific to the TTL + LRU policy.
pub trait TtlLruMetricsRecorder: CoreMetricsRecorder {
    fn record_expired_removal(&mut self);
    fn record_touch_call(&mut self);
    fn record_touch_found(&mut self);
    fn record_pop_lru_call(&mut self);
    fn record_pop_lru_found(&mut self);
}

/// Counters recorded on `&self` read paths (cell-backed).
pub trait TtlLruMetricsReadRecorder {
    fn record_peek_call(&self);
    fn record_peek_found(&self);
}

/// Anything that can materialize a point-in-time metrics snapshot.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}
