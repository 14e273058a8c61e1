// src/core/content/resolved.rs

//! The result an authority hands back for a path that resolves to something.

use super::compression::CompressedFormat;
use super::descriptor::{BodyStorage, ContentDescriptor, Resource};
use super::http_date::format_http_date;
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Content as resolved by a `ContentAuthority`, before any caching decision.
///
/// Built with [`ResolvedContent::file`] or [`ResolvedContent::directory`] and the
/// `with_*` methods. Preformatted header values are computed as fields are set.
#[derive(Debug, Clone)]
pub struct ResolvedContent {
    resource: Resource,
    mime_type: Option<String>,
    character_encoding: Option<String>,
    content_length: u64,
    content_length_header: Option<String>,
    etag: Option<String>,
    last_modified: Option<DateTime<Utc>>,
    last_modified_header: Option<String>,
    precompressed: Vec<CompressedFormat>,
    body: Option<Bytes>,
    storage: BodyStorage,
}

impl ResolvedContent {
    /// Content for a regular file with the given length and no body loaded yet.
    pub fn file(resource: Resource, content_length: u64) -> Self {
        let mut buf = itoa::Buffer::new();
        let content_length_header = Some(buf.format(content_length).to_string());
        Self {
            resource,
            mime_type: None,
            character_encoding: None,
            content_length,
            content_length_header,
            etag: None,
            last_modified: None,
            last_modified_header: None,
            precompressed: Vec::new(),
            body: None,
            storage: BodyStorage::Heap,
        }
    }

    /// Content for a directory. Directories carry no body and are never cached.
    pub fn directory(resource: Resource) -> Self {
        Self {
            resource,
            mime_type: None,
            character_encoding: None,
            content_length: 0,
            content_length_header: None,
            etag: None,
            last_modified: None,
            last_modified_header: None,
            precompressed: Vec::new(),
            body: None,
            storage: BodyStorage::Heap,
        }
    }

    /// Convenience constructor for an in-memory body; the length is taken from it.
    pub fn from_bytes(resource: Resource, body: Bytes) -> Self {
        let len = body.len() as u64;
        Self::file(resource, len).with_body(body, BodyStorage::Heap)
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_character_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.character_encoding = Some(encoding.into());
        self
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        let etag = etag.into();
        self.etag = if etag.trim().is_empty() {
            None
        } else {
            Some(etag)
        };
        self
    }

    pub fn with_last_modified(mut self, instant: DateTime<Utc>) -> Self {
        self.last_modified_header = Some(format_http_date(instant));
        self.last_modified = Some(instant);
        self
    }

    pub fn with_precompressed(mut self, formats: Vec<CompressedFormat>) -> Self {
        self.precompressed = formats;
        self
    }

    pub fn with_body(mut self, body: Bytes, storage: BodyStorage) -> Self {
        self.body = Some(body);
        self.storage = storage;
        self
    }
}

impl ContentDescriptor for ResolvedContent {
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
        self.body.clone()
    }

    fn resource(&self) -> Option<&Resource> {
        Some(&self.resource)
    }

    fn storage(&self) -> BodyStorage {
        self.storage
    }

    // Bodies are reference counted and freed when the last view drops.
    fn release(&self) -> bool {
        false
    }
}
