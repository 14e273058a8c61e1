// src/core/cache/eviction.rs

//! Implements the least-recently-used shrink pass for a `CacheStore`. It runs
//! after every admitted insertion and after every limit change.

use super::clock;
use super::entry::CacheEntry;
use super::store::CacheStore;
use crate::core::content::ContentDescriptor;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// An entry with its sort keys read once, so the ordering cannot shift under
/// concurrent access stamps while the snapshot is being sorted.
struct Candidate {
    last_accessed: u64,
    length: u64,
    entry: Arc<CacheEntry>,
}

impl Candidate {
    fn new(entry: Arc<CacheEntry>) -> Self {
        Self {
            last_accessed: entry.last_accessed_nanos(),
            length: entry.content_length_value(),
            entry,
        }
    }
}

/// Least recently accessed first, then smallest, then by key.
fn eviction_order(a: &Candidate, b: &Candidate) -> Ordering {
    clock::elapsed_nanos(b.last_accessed, a.last_accessed)
        .cmp(&0)
        .then_with(|| a.length.cmp(&b.length))
        .then_with(|| a.entry.key().cmp(b.entry.key()))
}

impl CacheStore {
    /// Evicts entries in LRU order until both the count and byte limits hold.
    ///
    /// Entries inserted concurrently while a pass is walking its snapshot are
    /// picked up by re-snapshotting until the limits are met or the store is
    /// empty. Returns the number of entries this call evicted.
    pub fn shrink_cache(&self) -> usize {
        let mut evicted = 0;

        while !self.is_empty() && self.exceeds_limits() {
            let mut candidates: Vec<Candidate> = self
                .snapshot_entries()
                .into_iter()
                .map(Candidate::new)
                .collect();
            candidates.sort_by(eviction_order);

            for candidate in &candidates {
                if !self.exceeds_limits() {
                    break;
                }
                if self.remove_entry(&candidate.entry) {
                    self.stats().increment_evictions();
                    evicted += 1;
                    debug!(
                        "Evicted LRU entry '{}' ({} bytes).",
                        candidate.entry.key(),
                        candidate.length
                    );
                }
            }
        }

        if evicted > 0 {
            debug!(
                "Shrink pass evicted {} entries; {} entries / {} bytes remain.",
                evicted,
                self.cached_files(),
                self.cached_size()
            );
        }
        evicted
    }

    fn exceeds_limits(&self) -> bool {
        self.cached_files() > self.max_cached_files() || self.cached_size() > self.max_cache_size()
    }
}
