// src/core/metrics.rs

//! Defines and registers Prometheus metrics for cache monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, TextEncoder, register_counter, register_counter_vec,
    register_gauge, register_histogram,
};

lazy_static! {
    // --- Cache Gauges ---
    /// The aggregate number of body bytes currently held by the cache.
    pub static ref CACHED_BYTES: Gauge =
        register_gauge!("contentcache_cached_bytes", "Total body bytes currently cached.").unwrap();
    /// The number of entries (content and negative) currently cached.
    pub static ref CACHED_FILES: Gauge =
        register_gauge!("contentcache_cached_files", "Number of entries currently cached.").unwrap();


    // --- Cache Counters ---
    /// The total number of lookups served from the cache, labeled by entry kind.
    pub static ref CACHE_HITS_TOTAL: CounterVec =
        register_counter_vec!("contentcache_hits_total", "Total number of cache hits, labeled by entry kind.", &["kind"]).unwrap();
    /// The total number of lookups that had to consult the authority.
    pub static ref CACHE_MISSES_TOTAL: Counter =
        register_counter!("contentcache_misses_total", "Total number of cache misses.").unwrap();
    /// The total number of resolved results served without being admitted.
    pub static ref CACHE_UNCACHED_TOTAL: Counter =
        register_counter!("contentcache_uncached_total", "Total number of results served uncached.").unwrap();
    /// The total number of entries evicted by shrink passes.
    pub static ref CACHE_EVICTIONS_TOTAL: Counter =
        register_counter!("contentcache_evictions_total", "Total number of cache entries evicted.").unwrap();


    // --- Histograms ---
    /// A histogram of authority resolution latencies on the miss path.
    pub static ref RESOLVE_LATENCY_SECONDS: Histogram =
        register_histogram!("contentcache_resolve_latency_seconds", "Latency of authority resolution in seconds.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
