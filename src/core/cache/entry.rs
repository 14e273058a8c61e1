// src/core/cache/entry.rs

//! The two kinds of record the cache stores: a captured content snapshot and
//! a negative "not found" sentinel.

use super::clock;
use crate::core::ContentCacheError;
use crate::core::content::{BodyStorage, CompressedFormat, ContentDescriptor, Resource};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// How cached bodies are handed to readers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BufferMode {
    /// Readers share the cached allocation through reference counting.
    #[default]
    Shared,
    /// Every read returns a fresh copy of the body.
    Copy,
}

/// An immutable capture of a resolved content's metadata and body, taken at
/// admission time. Only the access stamp changes afterwards.
#[derive(Debug)]
pub struct ContentSnapshot {
    key: String,
    resource: Option<Resource>,
    mime_type: Option<String>,
    character_encoding: Option<String>,
    content_length: u64,
    content_length_header: Option<String>,
    etag: Option<String>,
    last_modified: Option<DateTime<Utc>>,
    last_modified_header: Option<String>,
    precompressed: Vec<CompressedFormat>,
    /// `None` when the authority held no body in memory.
    body: Option<Bytes>,
    storage: BodyStorage,
    buffer_mode: BufferMode,
    last_accessed: AtomicU64,
    released: AtomicBool,
}

impl ContentSnapshot {
    /// Copies every metadata field out of `content` and keeps a reference on its body.
    ///
    /// Fails without side effects if the body does not match the declared length.
    pub fn capture(
        key: &str,
        content: &dyn ContentDescriptor,
        buffer_mode: BufferMode,
    ) -> Result<Self, ContentCacheError> {
        let content_length = content.content_length_value();
        let body = content.buffer();
        if let Some(body) = &body
            && body.len() as u64 != content_length
        {
            return Err(ContentCacheError::InvalidContent {
                path: key.to_string(),
                reason: format!(
                    "body holds {} bytes but content length is {}",
                    body.len(),
                    content_length
                ),
            });
        }

        Ok(Self {
            key: key.to_string(),
            resource: content.resource().cloned(),
            mime_type: content.mime_type().map(str::to_string),
            character_encoding: content.character_encoding().map(str::to_string),
            content_length,
            content_length_header: content.content_length().map(str::to_string),
            etag: content.etag_value().map(str::to_string),
            last_modified: content.last_modified_instant(),
            last_modified_header: content.last_modified_value().map(str::to_string),
            precompressed: content.precompressed_formats().to_vec(),
            body,
            storage: content.storage(),
            buffer_mode,
            last_accessed: AtomicU64::new(clock::now_nanos()),
            released: AtomicBool::new(false),
        })
    }
}

impl ContentDescriptor for ContentSnapshot {
    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    fn character_encoding(&self) -> Option<&str> {
        self.character_encoding.as_deref()
    }

    fn content_length_value(&self) -> u64 {
        self.content_length
    }

    fn content_length(&self) -> Option<&str> {
        self.content_length_header.as_deref()
    }

    fn etag_value(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    fn last_modified_instant(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    fn last_modified_value(&self) -> Option<&str> {
        self.last_modified_header.as_deref()
    }

    fn precompressed_formats(&self) -> &[CompressedFormat] {
        &self.precompressed
    }

    fn buffer(&self) -> Option<Bytes> {
        match self.buffer_mode {
            BufferMode::Shared => self.body.clone(),
            BufferMode::Copy => self.body.as_deref().map(Bytes::copy_from_slice),
        }
    }

    fn resource(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }

    fn storage(&self) -> BodyStorage {
        self.storage
    }

    /// Marks the snapshot as released by the store. The body stays readable
    /// through every outstanding handle; the allocation (or mapping) is freed
    /// when the last handle and view drop.
    fn release(&self) -> bool {
        !self.released.swap(true, Ordering::AcqRel)
    }
}

/// A cached negative lookup: the path was resolved and found to hold nothing.
#[derive(Debug)]
pub struct NegativeEntry {
    key: String,
    last_accessed: AtomicU64,
}

impl NegativeEntry {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            last_accessed: AtomicU64::new(clock::now_nanos()),
        }
    }
}

impl ContentDescriptor for NegativeEntry {
    fn mime_type(&self) -> Option<&str> {
        None
    }

    fn character_encoding(&self) -> Option<&str> {
        None
    }

    fn content_length_value(&self) -> u64 {
        0
    }

    fn content_length(&self) -> Option<&str> {
        None
    }

    fn etag_value(&self) -> Option<&str> {
        None
    }

    fn last_modified_instant(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn last_modified_value(&self) -> Option<&str> {
        None
    }

    fn precompressed_formats(&self) -> &[CompressedFormat] {
        &[]
    }

    fn buffer(&self) -> Option<Bytes> {
        None
    }

    fn resource(&self) -> Option<&Resource> {
        None
    }

    fn release(&self) -> bool {
        false
    }
}

/// A record held by the `CacheStore`.
#[derive(Debug)]
pub enum CacheEntry {
    Content(ContentSnapshot),
    NotFound(NegativeEntry),
}

impl CacheEntry {
    pub fn not_found(key: &str) -> Self {
        CacheEntry::NotFound(NegativeEntry::new(key))
    }

    /// The lookup path this entry is stored under.
    pub fn key(&self) -> &str {
        match self {
            CacheEntry::Content(c) => &c.key,
            CacheEntry::NotFound(n) => &n.key,
        }
    }

    pub fn last_accessed_nanos(&self) -> u64 {
        self.access_stamp().load(Ordering::Relaxed)
    }

    /// Stamps the entry as accessed. Concurrent stamps may overwrite each other.
    pub fn set_last_accessed_nanos(&self, nanos: u64) {
        self.access_stamp().store(nanos, Ordering::Relaxed);
    }

    /// Whether the entry may still be served. Both variants are valid for as
    /// long as they are stored; stale content is dropped by removal.
    pub fn is_valid(&self) -> bool {
        true
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheEntry::NotFound(_))
    }

    fn access_stamp(&self) -> &AtomicU64 {
        match self {
            CacheEntry::Content(c) => &c.last_accessed,
            CacheEntry::NotFound(n) => &n.last_accessed,
        }
    }

    fn descriptor(&self) -> &dyn ContentDescriptor {
        match self {
            CacheEntry::Content(c) => c,
            CacheEntry::NotFound(n) => n,
        }
    }
}

impl ContentDescriptor for CacheEntry {
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

    fn release(&self) -> bool {
        self.descriptor().release()
    }
}
