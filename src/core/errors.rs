// src/core/errors.rs

//! Defines the primary error type for the content cache.

use std::sync::Arc;
use thiserror::Error;

/// Every failure the cache, its authorities, and the serving layer can report.
///
/// Absence of content is not an error: lookups report it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum ContentCacheError {
    /// The authority failed to resolve a path. Never cached.
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    /// The authority returned a result that cannot be captured as a snapshot.
    #[error("Invalid content for '{path}': {reason}")]
    InvalidContent { path: String, reason: String },

    /// A configuration value was rejected. No state was changed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Internal Error: {0}")]
    Internal(String),
}

impl ContentCacheError {
    /// Returns `true` for errors that originate from resolving content,
    /// as opposed to configuration or plumbing failures.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            ContentCacheError::Io(_) | ContentCacheError::InvalidContent { .. }
        )
    }
}

// `std::io::Error` is not cloneable, so the `Io` variant shares it through an Arc.
impl Clone for ContentCacheError {
    fn clone(&self) -> Self {
        match self {
            ContentCacheError::Io(e) => ContentCacheError::Io(Arc::clone(e)),
            ContentCacheError::InvalidContent { path, reason } => {
                ContentCacheError::InvalidContent {
                    path: path.clone(),
                    reason: reason.clone(),
                }
            }
            ContentCacheError::InvalidConfig(s) => ContentCacheError::InvalidConfig(s.clone()),
            ContentCacheError::InvalidPath(s) => ContentCacheError::InvalidPath(s.clone()),
            ContentCacheError::Internal(s) => ContentCacheError::Internal(s.clone()),
        }
    }
}

impl PartialEq for ContentCacheError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ContentCacheError::Io(e1), ContentCacheError::Io(e2)) => {
                e1.kind() == e2.kind() && e1.to_string() == e2.to_string()
            }
            (
                ContentCacheError::InvalidContent {
                    path: p1,
                    reason: r1,
                },
                ContentCacheError::InvalidContent {
                    path: p2,
                    reason: r2,
                },
            ) => p1 == p2 && r1 == r2,
            (ContentCacheError::InvalidConfig(s1), ContentCacheError::InvalidConfig(s2)) => {
                s1 == s2
            }
            (ContentCacheError::InvalidPath(s1), ContentCacheError::InvalidPath(s2)) => s1 == s2,
            (ContentCacheError::Internal(s1), ContentCacheError::Internal(s2)) => s1 == s2,
            _ => false,
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for ContentCacheError {
    fn from(e: std::io::Error) -> Self {
        ContentCacheError::Io(Arc::new(e))
    }
}

impl From<tokio::task::JoinError> for ContentCacheError {
    fn from(e: tokio::task::JoinError) -> Self {
        ContentCacheError::Internal(format!("Blocking task failed: {e}"))
    }
}
