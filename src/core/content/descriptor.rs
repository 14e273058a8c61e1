// src/core/content/descriptor.rs

//! The shared contract implemented by authority results and cache entries.

use super::compression::CompressedFormat;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Whether a resource handle points at a regular file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    File,
    Directory,
}

/// Where a body buffer lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyStorage {
    /// Bytes copied onto the heap.
    #[default]
    Heap,
    /// Bytes backed by a memory-mapped file. Does not consume heap.
    FileMapped,
}

/// A handle on the underlying resource a descriptor was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    path: PathBuf,
    kind: ResourceKind,
}

impl Resource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ResourceKind::File,
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ResourceKind::Directory,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn is_directory(&self) -> bool {
        self.kind == ResourceKind::Directory
    }
}

/// Metadata and body of a piece of servable content.
///
/// Implemented by the authority's `ResolvedContent`, by both cache entry variants,
/// and by the `Content` handle returned to callers. Every call to [`buffer`]
/// hands out an independent view; callers never share a cursor.
///
/// [`buffer`]: ContentDescriptor::buffer
pub trait ContentDescriptor: Send + Sync {
    fn mime_type(&self) -> Option<&str>;

    fn character_encoding(&self) -> Option<&str>;

    /// The full `Content-Type` header value, including the charset when known.
    fn content_type_value(&self) -> Option<String> {
        let mime = self.mime_type()?;
        Some(match self.character_encoding() {
            Some(charset) => format!("{mime};charset={charset}"),
            None => mime.to_string(),
        })
    }

    /// The body length in bytes. `0` when the length is unknown or there is no body.
    fn content_length_value(&self) -> u64;

    /// The preformatted `Content-Length` header value.
    fn content_length(&self) -> Option<&str>;

    fn etag_value(&self) -> Option<&str>;

    fn last_modified_instant(&self) -> Option<DateTime<Utc>>;

    /// The preformatted `Last-Modified` header value.
    fn last_modified_value(&self) -> Option<&str>;

    /// The precompressed variants available for this content.
    fn precompressed_formats(&self) -> &[CompressedFormat];

    /// An independent view of the body, or `None` when no body is held in memory.
    fn buffer(&self) -> Option<Bytes>;

    fn resource(&self) -> Option<&Resource>;

    fn storage(&self) -> BodyStorage {
        BodyStorage::Heap
    }

    /// Releases any resources held on behalf of this content.
    ///
    /// Returns `true` if this call released something, `false` if there was
    /// nothing left to release. Views handed out earlier remain readable.
    fn release(&self) -> bool;
}
