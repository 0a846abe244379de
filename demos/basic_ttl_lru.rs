//! Example demonstrating the concurrent TTL + LRU cache.
//!
//! Run with: cargo run --example basic_ttl_lru

use std::thread;
use std::time::Duration;

use ttlkit::config::CacheConfig;
use ttlkit::policy::ttl_lru::ConcurrentTtlCache;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    println!("=== ConcurrentTtlCache Example ===\n");

    // threshold 10, hysteresis 0.2 → eviction band (8, 12)
    let config = CacheConfig::new(10.0, 0.2);
    let cache: ConcurrentTtlCache<u64, String> =
        ConcurrentTtlCache::from_config(&config).unwrap();
    println!(
        "band: ({}, {})",
        config.lower_threshold(),
        config.upper_threshold()
    );

    cache.on_eviction(|key, value| {
        println!("   evicted key={} value={}", key, value);
    });

    // Example 1: round trip and TTL expiry
    println!("\n1. Round trip and expiry");
    cache.insert(1, "short-lived".to_string(), Duration::from_millis(50));
    println!("   get(1) right away: {:?}", cache.get(&1));
    thread::sleep(Duration::from_millis(80));
    println!("   get(1) after ttl:  {:?}", cache.get(&1));

    // Example 2: crossing the band triggers a background sweep
    println!("\n2. Background reclamation");
    for i in 0..=12u64 {
        cache.insert(i, format!("item{}", i), Duration::from_secs(60));
    }
    println!("   inserted 13 items, waiting for the sweep...");
    thread::sleep(Duration::from_millis(300));
    println!("   size settled at {}", cache.len());

    // Example 3: statistics
    println!("\n3. Statistics");
    let _ = cache.get(&12); // hit
    let _ = cache.get(&999); // miss
    println!("   hit rate: {:.3}", cache.hit_rate());
    let snapshot = cache.metrics_snapshot();
    println!(
        "   sweeps: {}, evicted: {}, expired: {}",
        snapshot.sweeps_started, snapshot.evicted_entries, snapshot.expired_removals
    );
}
