// src/core/authority/filesystem.rs

//! A `ContentAuthority` serving files from a root directory.

use super::ContentAuthority;
use super::mime;
use crate::config::AuthorityConfig;
use crate::core::ContentCacheError;
use crate::core::content::http_date::to_http_instant;
use crate::core::content::{BodyStorage, CompressedFormat, Resource, ResolvedContent};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use memmap2::Mmap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Resolves request paths against files under `root`.
#[derive(Debug, Clone)]
pub struct FileSystemAuthority {
    root: PathBuf,
    config: AuthorityConfig,
}

impl FileSystemAuthority {
    pub fn new(root: impl Into<PathBuf>, config: AuthorityConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path onto the filesystem. Returns `None` for paths that
    /// would escape the root.
    fn map_path(&self, request_path: &str) -> Option<PathBuf> {
        let mut mapped = self.root.clone();
        for component in Path::new(request_path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(segment) => mapped.push(segment),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(mapped)
    }

    /// Probes for sibling variants concurrently, keeping the configured order.
    async fn discover_precompressed(&self, path: &Path) -> Vec<CompressedFormat> {
        let probes = self.config.precompressed.iter().map(|format| async move {
            let mut variant = OsString::from(path.as_os_str());
            variant.push(format.extension());
            let exists = tokio::fs::metadata(&variant)
                .await
                .is_ok_and(|meta| meta.is_file());
            exists.then_some(*format)
        });
        join_all(probes).await.into_iter().flatten().collect()
    }

    /// Loads the body, either memory-mapped or onto the heap. Files too large to
    /// buffer are left unloaded.
    async fn load_body(
        &self,
        path: &Path,
        len: u64,
    ) -> Result<Option<(Bytes, BodyStorage)>, ContentCacheError> {
        if self.config.file_mapping && len > 0 {
            let mapped = map_file(path.to_path_buf()).await?;
            return Ok(Some((mapped, BodyStorage::FileMapped)));
        }
        if len > self.config.max_buffered_file_size {
            return Ok(None);
        }
        let bytes = tokio::fs::read(path).await?;
        Ok(Some((Bytes::from(bytes), BodyStorage::Heap)))
    }
}

#[async_trait]
impl ContentAuthority for FileSystemAuthority {
    async fn resolve(&self, path: &str) -> Result<Option<ResolvedContent>, ContentCacheError> {
        let Some(fs_path) = self.map_path(path) else {
            debug!("Rejected path '{}' escaping the content root.", path);
            return Ok(None);
        };

        let metadata = match tokio::fs::metadata(&fs_path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if metadata.is_dir() {
            return Ok(Some(ResolvedContent::directory(Resource::directory(
                fs_path,
            ))));
        }
        if !metadata.is_file() {
            return Ok(None);
        }

        // The file may change between stat and read; the loaded body is authoritative.
        let body = match self.load_body(&fs_path, metadata.len()).await {
            Ok(body) => body,
            Err(ContentCacheError::Io(e)) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let len = body
            .as_ref()
            .map_or(metadata.len(), |(bytes, _)| bytes.len() as u64);

        let mut content = ResolvedContent::file(Resource::file(&fs_path), len);
        if let Some((bytes, storage)) = body {
            content = content.with_body(bytes, storage);
        }
        if let Some(mime) = mime::for_path(&fs_path) {
            content = content.with_mime_type(mime.essence);
            if let Some(charset) = mime.charset {
                content = content.with_character_encoding(charset);
            }
        }
        if let Ok(modified) = metadata.modified() {
            let instant = to_http_instant(modified);
            content = content.with_last_modified(instant);
            if self.config.etags {
                content = content.with_etag(weak_etag(instant, len));
            }
        }
        let precompressed = self.discover_precompressed(&fs_path).await;
        Ok(Some(content.with_precompressed(precompressed)))
    }
}

/// A weak validator derived from the modification time and length.
fn weak_etag(modified: DateTime<Utc>, len: u64) -> String {
    let mut raw = [0u8; 16];
    raw[..8].copy_from_slice(&modified.timestamp_millis().to_be_bytes());
    raw[8..].copy_from_slice(&len.to_be_bytes());
    format!("W/\"{}\"", hex::encode(raw))
}

async fn map_file(path: PathBuf) -> Result<Bytes, ContentCacheError> {
    tokio::task::spawn_blocking(move || -> Result<Bytes, ContentCacheError> {
        let file = std::fs::File::open(&path)?;
        // SAFETY: the mapping is read-only. Files under the content root must not
        // be truncated while mapped.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Bytes::from_owner(map))
    })
    .await?
}
