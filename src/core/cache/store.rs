// src/core/cache/store.rs

//! Defines the `CacheStore`: the concurrent path-to-entry map, the aggregate
//! byte counter, the configurable limits, and the admission policy.

use super::entry::{BufferMode, CacheEntry};
use super::stats::CacheStats;
use crate::config::CacheConfig;
use crate::core::ContentCacheError;
use crate::core::content::{BodyStorage, ContentDescriptor};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, info};

/// The thread-safe store of cached entries.
///
/// The map is sharded, so operations on unrelated keys never serialize on a
/// single lock. The byte counter is updated with atomic adds and converges to
/// the sum of the stored entries' lengths once in-flight mutations complete.
#[derive(Debug)]
pub struct CacheStore {
    entries: DashMap<String, Arc<CacheEntry>>,
    cached_size: AtomicI64,
    max_cached_file_size: AtomicU64,
    max_cache_size: AtomicU64,
    max_cached_files: AtomicUsize,
    buffer_mode: BufferMode,
    stats: CacheStats,
}

impl CacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            cached_size: AtomicI64::new(0),
            max_cached_file_size: AtomicU64::new(config.max_cached_file_size),
            max_cache_size: AtomicU64::new(config.max_cache_size),
            max_cached_files: AtomicUsize::new(config.max_cached_files),
            buffer_mode: config.buffer_mode,
            stats: CacheStats::default(),
        }
    }

    /// Returns the entry stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The aggregate number of body bytes currently cached.
    pub fn cached_size(&self) -> u64 {
        self.cached_size.load(Ordering::Acquire).max(0) as u64
    }

    /// The number of entries currently cached, negative entries included.
    pub fn cached_files(&self) -> usize {
        self.entries.len()
    }

    pub fn buffer_mode(&self) -> BufferMode {
        self.buffer_mode
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    // --- Limits ---

    pub fn max_cached_file_size(&self) -> u64 {
        self.max_cached_file_size.load(Ordering::Relaxed)
    }

    pub fn max_cache_size(&self) -> u64 {
        self.max_cache_size.load(Ordering::Relaxed)
    }

    pub fn max_cached_files(&self) -> usize {
        self.max_cached_files.load(Ordering::Relaxed)
    }

    /// Sets the largest body that may be admitted, then evicts down to the limits.
    pub fn set_max_cached_file_size(&self, bytes: i64) -> Result<(), ContentCacheError> {
        let bytes = non_negative("max_cached_file_size", bytes)?;
        self.max_cached_file_size.store(bytes, Ordering::Relaxed);
        info!("Cache max_cached_file_size set to {} bytes.", bytes);
        self.shrink_cache();
        Ok(())
    }

    /// Sets the aggregate byte limit, then evicts down to it.
    pub fn set_max_cache_size(&self, bytes: i64) -> Result<(), ContentCacheError> {
        let bytes = non_negative("max_cache_size", bytes)?;
        self.max_cache_size.store(bytes, Ordering::Relaxed);
        info!("Cache max_cache_size set to {} bytes.", bytes);
        self.shrink_cache();
        Ok(())
    }

    /// Sets the entry count limit, then evicts down to it. `0` disables caching.
    pub fn set_max_cached_files(&self, files: i64) -> Result<(), ContentCacheError> {
        let files = usize::try_from(non_negative("max_cached_files", files)?).map_err(|_| {
            ContentCacheError::InvalidConfig(format!(
                "max_cached_files {files} does not fit this platform"
            ))
        })?;
        self.max_cached_files.store(files, Ordering::Relaxed);
        info!("Cache max_cached_files set to {}.", files);
        self.shrink_cache();
        Ok(())
    }

    // --- Admission ---

    /// Decides whether an authority result may enter the cache.
    ///
    /// `None` is the authority's "absent" signal; it is admitted as a negative
    /// entry unless caching is disabled.
    pub fn is_cacheable(&self, content: Option<&dyn ContentDescriptor>) -> bool {
        let max_files = self.max_cached_files();
        let Some(content) = content else {
            return max_files > 0;
        };

        if content.resource().is_some_and(|r| r.is_directory()) {
            return false;
        }
        if max_files == 0 {
            return false;
        }

        let len = content.content_length_value();
        if len == 0 {
            return false;
        }
        // Content left on disk by the authority would be charged bytes it does not hold.
        if content.buffer().is_none() {
            return false;
        }
        if content.storage() == BodyStorage::FileMapped {
            return true;
        }
        len <= self.max_cached_file_size() && len <= self.max_cache_size()
    }

    // --- Mutation ---

    /// Atomically returns the entry under `key`, building and inserting one with
    /// `build` if there is none.
    ///
    /// The boolean is `true` when this call performed the insertion. `build` runs
    /// at most once and only while the key is vacant; if it fails nothing is
    /// inserted and the counter is untouched.
    pub(crate) fn get_or_insert_with<F>(
        &self,
        key: &str,
        build: F,
    ) -> Result<(Arc<CacheEntry>, bool), ContentCacheError>
    where
        F: FnOnce() -> Result<CacheEntry, ContentCacheError>,
    {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) => Ok((occupied.get().clone(), false)),
            Entry::Vacant(vacant) => {
                let entry = Arc::new(build()?);
                self.cached_size
                    .fetch_add(entry.content_length_value() as i64, Ordering::AcqRel);
                vacant.insert(entry.clone());
                debug!(
                    "Cached '{}' ({} bytes, negative: {}).",
                    key,
                    entry.content_length_value(),
                    entry.is_not_found()
                );
                Ok((entry, true))
            }
        }
    }

    /// Removes whatever entry is stored under `key`. Returns `true` if one was removed.
    pub fn remove(&self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some((_, removed)) => {
                self.finish_removal(&removed);
                true
            }
            None => false,
        }
    }

    /// Removes `entry` only if it is still the instance stored under its key,
    /// so a stale handle never removes a fresher replacement.
    pub(crate) fn remove_entry(&self, entry: &Arc<CacheEntry>) -> bool {
        match self
            .entries
            .remove_if(entry.key(), |_, stored| Arc::ptr_eq(stored, entry))
        {
            Some((_, removed)) => {
                self.finish_removal(&removed);
                true
            }
            None => false,
        }
    }

    /// Removes and releases every entry. Limits are left untouched.
    pub fn flush(&self) {
        let flushed = self
            .snapshot_entries()
            .iter()
            .filter(|entry| self.remove_entry(entry))
            .count();
        info!("Flushed {} entries from the content cache.", flushed);
    }

    fn finish_removal(&self, removed: &CacheEntry) {
        removed.release();
        self.cached_size
            .fetch_sub(removed.content_length_value() as i64, Ordering::AcqRel);
    }

    pub(super) fn snapshot_entries(&self) -> Vec<Arc<CacheEntry>> {
        self.entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn non_negative(name: &str, value: i64) -> Result<u64, ContentCacheError> {
    u64::try_from(value).map_err(|_| {
        ContentCacheError::InvalidConfig(format!("{name} cannot be negative (got {value})"))
    })
}
