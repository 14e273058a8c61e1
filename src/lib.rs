// src/lib.rs

pub mod config;
pub mod core;
pub mod server;

// Re-export
pub use crate::core::{CachingContentFactory, Content, ContentAuthority, ContentCacheError};
