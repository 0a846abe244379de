/// Point-in-time copy of [`TtlLruMetrics`](crate::metrics::TtlLruMetrics)
/// plus gauges captured at snapshot time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TtlLruMetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,
    pub expired_removals: u64,

    pub insert_calls: u64,
    pub insert_updates: u64,
    pub insert_new: u64,

    pub evicted_entries: u64,

    pub touch_calls: u64,
    pub touch_found: u64,
    pub pop_lru_calls: u64,
    pub pop_lru_found: u64,
    pub clear_calls: u64,
    pub peek_calls: u64,
    pub peek_found: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub sweeps_started: u64,
}

impl TtlLruMetricsSnapshot {
    /// Total lookup operations at snapshot time.
    #[inline]
    pub fn lookups(&self) -> u64 {
        self.get_hits + self.get_misses
    }

    /// Fraction of lookups that hit, `0.0` before any lookup was recorded.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.lookups();
        if lookups == 0 {
            return 0.0;
        }
        self.get_hits as f64 / lookups as f64
    }
}
