// src/core/cache/stats.rs

//! Per-store counters, mirrored into the global Prometheus metrics.

use crate::core::metrics;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lookup and eviction counters for one `CacheStore`.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Lookups served from a cached content snapshot.
    pub hits: AtomicU64,
    /// Lookups answered "absent" from a cached negative entry.
    pub negative_hits: AtomicU64,
    /// Lookups that consulted the authority.
    pub misses: AtomicU64,
    /// Resolved results returned without being admitted.
    pub uncached: AtomicU64,
    /// Entries removed by shrink passes.
    pub evictions: AtomicU64,
}

/// A point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub negative_hits: u64,
    pub misses: u64,
    pub uncached: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn increment_hits(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        metrics::CACHE_HITS_TOTAL.with_label_values(&["content"]).inc();
    }

    pub fn increment_negative_hits(&self) {
        self.negative_hits.fetch_add(1, Ordering::Relaxed);
        metrics::CACHE_HITS_TOTAL
            .with_label_values(&["not_found"])
            .inc();
    }

    pub fn increment_misses(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::CACHE_MISSES_TOTAL.inc();
    }

    pub fn increment_uncached(&self) {
        self.uncached.fetch_add(1, Ordering::Relaxed);
        metrics::CACHE_UNCACHED_TOTAL.inc();
    }

    pub fn increment_evictions(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
        metrics::CACHE_EVICTIONS_TOTAL.inc();
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            negative_hits: self.negative_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            uncached: self.uncached.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
