// src/core/cache/factory.rs

//! The `CachingContentFactory`: lookup-or-resolve-and-admit over a
//! `ContentAuthority` and a `CacheStore`.

use super::clock;
use super::entry::{CacheEntry, ContentSnapshot};
use super::stats::CacheStatsSnapshot;
use super::store::CacheStore;
use crate::config::CacheConfig;
use crate::core::ContentCacheError;
use crate::core::authority::ContentAuthority;
use crate::core::content::{
    BodyStorage, CompressedFormat, ContentDescriptor, Resource, ResolvedContent,
};
use crate::core::metrics;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Content handed to callers: either a shared cached entry or an authority
/// result that was not admitted.
#[derive(Debug, Clone)]
pub enum Content {
    Cached(Arc<CacheEntry>),
    Uncached(Arc<ResolvedContent>),
}

impl Content {
    /// Maps a stored entry to what callers see; negative entries read as absent.
    fn from_entry(entry: Arc<CacheEntry>) -> Option<Self> {
        if entry.is_not_found() {
            None
        } else {
            Some(Content::Cached(entry))
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Content::Cached(_))
    }

    fn descriptor(&self) -> &dyn ContentDescriptor {
        match self {
            Content::Cached(entry) => entry.as_ref(),
            Content::Uncached(resolved) => resolved.as_ref(),
        }
    }
}

impl ContentDescriptor for Content {
    fn mime_type(&self) -> Option<&str> {
        self.descriptor().mime_type()
    }

    fn character_encoding(&self) -> Option<&str> {
        self.descriptor().character_encoding()
    }

    fn content_length_value(&self) -> u64 {
        self.descriptor().content_length_value()
    }

    fn content_length(&self) -> Option<&str> {
        self.descriptor().content_length()
    }

    fn etag_value(&self) -> Option<&str> {
        self.descriptor().etag_value()
    }

    fn last_modified_instant(&self) -> Option<DateTime<Utc>> {
        self.descriptor().last_modified_instant()
    }

    fn last_modified_value(&self) -> Option<&str> {
        self.descriptor().last_modified_value()
    }

    fn precompressed_formats(&self) -> &[CompressedFormat] {
        self.descriptor().precompressed_formats()
    }

    fn buffer(&self) -> Option<Bytes> {
        self.descriptor().buffer()
    }

    fn resource(&self) -> Option<&Resource> {
        self.descriptor().resource()
    }

    fn storage(&self) -> BodyStorage {
        self.descriptor().storage()
    }

    /// Cached entries are owned by the store and released only on removal,
    /// so releasing through a caller handle is a no-op for them.
    fn release(&self) -> bool {
        match self {
            Content::Cached(_) => false,
            Content::Uncached(resolved) => resolved.release(),
        }
    }
}

/// Wraps a `ContentAuthority`, using it as the source of truth for misses and
/// caching admissible results in a bounded `CacheStore`.
pub struct CachingContentFactory {
    authority: Arc<dyn ContentAuthority>,
    store: CacheStore,
}

impl CachingContentFactory {
    pub fn new(authority: Arc<dyn ContentAuthority>, config: &CacheConfig) -> Self {
        Self {
            authority,
            store: CacheStore::new(config),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Returns the content for `path`, from the cache when possible.
    ///
    /// `Ok(None)` means the path resolves to nothing (possibly answered from a
    /// cached negative entry). Errors come only from the authority on a miss
    /// and are never cached.
    pub async fn get_content(&self, path: &str) -> Result<Option<Content>, ContentCacheError> {
        if let Some(entry) = self.store.get(path) {
            entry.set_last_accessed_nanos(clock::now_nanos());
            if entry.is_valid() {
                if entry.is_not_found() {
                    self.store.stats().increment_negative_hits();
                } else {
                    self.store.stats().increment_hits();
                }
                return Ok(Content::from_entry(entry));
            }
            debug!("Dropping invalid cache entry for '{}'.", path);
            self.store.remove_entry(&entry);
        }

        self.store.stats().increment_misses();
        let started = Instant::now();
        let resolved = self.authority.resolve(path).await.inspect_err(|e| {
            warn!("Authority failed to resolve '{}': {}", path, e);
        })?;
        metrics::RESOLVE_LATENCY_SECONDS.observe(started.elapsed().as_secs_f64());

        let descriptor = resolved.as_ref().map(|c| c as &dyn ContentDescriptor);
        if !self.store.is_cacheable(descriptor) {
            if resolved.is_some() {
                self.store.stats().increment_uncached();
                debug!("Serving '{}' uncached: not admissible.", path);
            }
            return Ok(resolved.map(|c| Content::Uncached(Arc::new(c))));
        }

        let buffer_mode = self.store.buffer_mode();
        let (entry, inserted) = self.store.get_or_insert_with(path, || match &resolved {
            Some(content) => {
                ContentSnapshot::capture(path, content, buffer_mode).map(CacheEntry::Content)
            }
            None => Ok(CacheEntry::not_found(path)),
        })?;

        if inserted {
            self.store.shrink_cache();
        } else if let Some(discarded) = &resolved {
            debug!(
                "Concurrent lookup cached '{}' first; discarding this resolution.",
                path
            );
            discarded.release();
        }

        Ok(Content::from_entry(entry))
    }

    /// Removes and releases every cached entry.
    pub fn flush_cache(&self) {
        self.store.flush();
    }

    /// Removes the entry cached under `path`. Returns `true` if there was one.
    pub fn remove(&self, path: &str) -> bool {
        self.store.remove(path)
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.store.stats().snapshot()
    }

    pub fn cached_size(&self) -> u64 {
        self.store.cached_size()
    }

    pub fn cached_files(&self) -> usize {
        self.store.cached_files()
    }

    pub fn max_cached_file_size(&self) -> u64 {
        self.store.max_cached_file_size()
    }

    pub fn set_max_cached_file_size(&self, bytes: i64) -> Result<(), ContentCacheError> {
        self.store.set_max_cached_file_size(bytes)
    }

    pub fn max_cache_size(&self) -> u64 {
        self.store.max_cache_size()
    }

    pub fn set_max_cache_size(&self, bytes: i64) -> Result<(), ContentCacheError> {
        self.store.set_max_cache_size(bytes)
    }

    pub fn max_cached_files(&self) -> usize {
        self.store.max_cached_files()
    }

    pub fn set_max_cached_files(&self, files: i64) -> Result<(), ContentCacheError> {
        self.store.set_max_cached_files(files)
    }
}
