// src/core/authority/mod.rs

//! Content authorities: the slower sources of truth the cache fronts.

pub mod filesystem;
pub mod mime;

use crate::core::ContentCacheError;
use crate::core::content::ResolvedContent;
use async_trait::async_trait;

pub use filesystem::FileSystemAuthority;

/// Resolves request paths to content.
///
/// `Ok(None)` is the well-defined "absent" signal and may be cached as a
/// negative entry. Errors are propagated to the caller unchanged and never cached.
#[async_trait]
pub trait ContentAuthority: Send + Sync {
    async fn resolve(&self, path: &str) -> Result<Option<ResolvedContent>, ContentCacheError>;
}
