// src/core/mod.rs

//! The central module containing the caching engine and its collaborators.

pub mod authority;
pub mod cache;
pub mod content;
pub mod errors;
pub mod metrics;

pub use authority::ContentAuthority;
pub use cache::{CachingContentFactory, Content};
pub use content::ContentDescriptor;
pub use errors::ContentCacheError;
