// ==============================================
// ENGINE CONCURRENCY TESTS (integration)
// ==============================================
//
// Background-sweep behavior of ConcurrentTtlCache: settling inside the
// hysteresis band, single-flight triggering, and recovery from listener
// panics. These require multi-threaded execution and cannot live inline.

#![cfg(feature = "concurrency")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use ttlkit::config::CacheConfig;
use ttlkit::policy::ttl_lru::ConcurrentTtlCache;

const MINUTE: Duration = Duration::from_secs(60);

/// Polls until `cond` holds or the timeout elapses; returns the final state.
fn wait_for(cond: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

// ==============================================
// Settling: threshold 10, hysteresis 0.2 → band (8, 12)
// ==============================================

mod settling {
    use super::*;

    #[test]
    fn thirteen_inserts_settle_at_lower_threshold_oldest_first() {
        let cache: ConcurrentTtlCache<u64, String> =
            ConcurrentTtlCache::from_config(&CacheConfig::new(10.0, 0.2)).unwrap();

        let evicted = Arc::new(Mutex::new(Vec::new()));
        let observer = Arc::clone(&evicted);
        cache.on_eviction(move |key, _| {
            observer.lock().unwrap().push(*key);
        });

        // 13 items: the 13th insert pushes the size past the upper edge (12)
        for i in 0..=12u64 {
            cache.insert(i, format!("item{}", i), MINUTE);
        }

        assert!(
            wait_for(|| cache.len() == 8, Duration::from_secs(5)),
            "size never settled at the lower threshold, got {}",
            cache.len()
        );

        // Not 9, 10, 11, or 12: the sweep runs past the upper edge down to
        // the lower one.
        assert_eq!(cache.len(), 8);
        assert_eq!(*evicted.lock().unwrap(), vec![0, 1, 2, 3, 4]);

        for i in 0..=4u64 {
            assert!(cache.get(&i).is_none(), "key {} survived the sweep", i);
        }
        for i in 5..=12u64 {
            assert!(cache.get(&i).is_some(), "key {} was wrongly evicted", i);
        }

        assert_eq!(cache.metrics_snapshot().sweeps_started, 1);
    }

    #[test]
    fn twelve_inserts_never_trigger_a_sweep() {
        let cache: ConcurrentTtlCache<u64, u64> =
            ConcurrentTtlCache::from_config(&CacheConfig::new(10.0, 0.2)).unwrap();

        // Sizes 1..=12 never exceed the upper edge
        for i in 0..12u64 {
            cache.insert(i, i, MINUTE);
        }

        thread::sleep(Duration::from_millis(100));
        assert_eq!(cache.len(), 12);
        assert_eq!(cache.metrics_snapshot().sweeps_started, 0);
    }

    #[test]
    fn inserts_inside_band_after_sweep_do_not_retrigger() {
        let cache: ConcurrentTtlCache<u64, u64> =
            ConcurrentTtlCache::with_thresholds(8.0, 12.0).unwrap();

        for i in 0..=12u64 {
            cache.insert(i, i, MINUTE);
        }
        assert!(wait_for(|| cache.len() == 8, Duration::from_secs(5)));

        // Back inside the band: the gate state cleared at 8, so a size of 9
        // neither resumes nor restarts eviction.
        cache.insert(100, 100, MINUTE);
        thread::sleep(Duration::from_millis(100));

        assert_eq!(cache.len(), 9);
        assert_eq!(cache.metrics_snapshot().sweeps_started, 1);
    }

    #[test]
    fn touched_key_survives_one_more_eviction_round() {
        let cache: ConcurrentTtlCache<u64, u64> =
            ConcurrentTtlCache::with_thresholds(8.0, 12.0).unwrap();

        for i in 0..12u64 {
            cache.insert(i, i, MINUTE);
        }
        // Key 0 is the oldest; touching it makes key 1 the victim instead
        assert!(cache.touch(&0));

        cache.insert(12, 12, MINUTE); // 13th item, triggers the sweep
        assert!(wait_for(|| cache.len() == 8, Duration::from_secs(5)));

        assert!(cache.get(&0).is_some(), "touched key was evicted");
        for i in 1..=5u64 {
            assert!(cache.get(&i).is_none(), "key {} outlived the sweep", i);
        }
    }
}

// ==============================================
// Single-flight: one sweep per burst
// ==============================================

mod single_flight {
    use super::*;

    #[test]
    fn concurrent_insert_burst_starts_exactly_one_sweep() {
        let cache: ConcurrentTtlCache<u64, u64> =
            ConcurrentTtlCache::with_thresholds(80.0, 120.0).unwrap();

        // Fill to the upper edge without crossing it
        for i in 0..120u64 {
            cache.insert(i, i, MINUTE);
        }
        assert_eq!(cache.metrics_snapshot().sweeps_started, 0);

        // 20 concurrent inserts: every one lands above the upper edge while
        // a sweep is (or just was) draining toward 80. The sweep removes at
        // least 41 entries before it can stop, so the at-most-19 inserts
        // remaining after it finishes can never lift the size back over 120.
        let threads = 4;
        let per_thread = 5;
        let barrier = Arc::new(Barrier::new(threads));
        let mut handles = Vec::new();
        for t in 0..threads as u64 {
            let cache = cache.clone();
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread as u64 {
                    cache.insert(1_000 + t * 100 + i, i, MINUTE);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(
            wait_for(|| cache.len() < 100, Duration::from_secs(5)),
            "sweep never drained the burst, size is {}",
            cache.len()
        );
        thread::sleep(Duration::from_millis(100));

        let snapshot = cache.metrics_snapshot();
        assert_eq!(snapshot.sweeps_started, 1, "expected a single sweep");
        let len = cache.len();
        assert!(
            (80..100).contains(&len),
            "size {} outside the post-sweep window",
            len
        );
    }
}

// ==============================================
// Listener failure: sweep aborts, cache stays usable
// ==============================================

mod listener_failure {
    use super::*;

    #[test]
    fn panicking_listener_aborts_sweep_but_not_the_cache() {
        let cache: ConcurrentTtlCache<u64, u64> =
            ConcurrentTtlCache::with_thresholds(2.0, 4.0).unwrap();

        let notifications = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&notifications);
        cache.on_eviction(move |key, _| {
            observer.fetch_add(1, Ordering::SeqCst);
            if *key == 0 {
                panic!("listener rejects key 0");
            }
        });

        // 5th insert crosses the upper edge (4) and triggers a sweep; the
        // sweep evicts key 0 and dies in the listener.
        for i in 0..=4u64 {
            cache.insert(i, i, MINUTE);
        }

        assert!(
            wait_for(|| cache.len() == 4, Duration::from_secs(5)),
            "aborted sweep should still have removed key 0"
        );
        assert_eq!(notifications.load(Ordering::SeqCst), 1);

        // Give the dying sweep thread time to release the in-flight flag
        thread::sleep(Duration::from_millis(100));

        // The cache is over its band but fully usable
        assert!(cache.get(&1).is_some());
        assert!(cache.get(&0).is_none());

        // A fresh trigger starts a second sweep, which now drains to the
        // lower edge (key 0 is gone, so the listener stays quiet).
        cache.insert(5, 5, MINUTE);
        assert!(
            wait_for(|| cache.len() == 2, Duration::from_secs(5)),
            "second sweep never drained, size is {}",
            cache.len()
        );
        assert_eq!(cache.metrics_snapshot().sweeps_started, 2);
    }
}

// ==============================================
// Expiry through the engine
// ==============================================

mod expiry {
    use super::*;

    #[test]
    fn expired_entry_is_absent_and_notifies_once() {
        let cache: ConcurrentTtlCache<u64, String> =
            ConcurrentTtlCache::with_thresholds(8.0, 12.0).unwrap();

        let notifications = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&notifications);
        cache.on_eviction(move |_, _| {
            observer.fetch_add(1, Ordering::SeqCst);
        });

        cache.insert(1, "item1".to_string(), Duration::from_millis(20));
        thread::sleep(Duration::from_millis(60));

        assert!(cache.get(&1).is_none());
        assert_eq!(notifications.load(Ordering::SeqCst), 1);

        // Already removed: no double notification
        assert!(cache.get(&1).is_none());
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }
}

// ==============================================
// Mixed-load smoke
// ==============================================

mod smoke {
    use super::*;

    #[test]
    fn concurrent_readers_and_writers_stay_consistent() {
        let cache: ConcurrentTtlCache<u64, u64> =
            ConcurrentTtlCache::with_thresholds(800.0, 1200.0).unwrap();

        let threads = 4;
        let barrier = Arc::new(Barrier::new(threads));
        let mut handles = Vec::new();
        for t in 0..threads as u64 {
            let cache = cache.clone();
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                for i in 0..500u64 {
                    let key = (t * 31 + i) % 100;
                    if i % 3 == 0 {
                        cache.insert(key, i, MINUTE);
                    } else {
                        let _ = cache.get(&key);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.len() <= 100);
        let rate = cache.hit_rate();
        assert!((0.0..=1.0).contains(&rate));
        assert_eq!(cache.metrics_snapshot().sweeps_started, 0);
    }
}
