// src/core/cache/mod.rs

//! The caching engine: entries, the concurrent store with its admission and
//! eviction policy, and the factory that fronts a content authority.

pub mod clock;
pub mod entry;
pub mod eviction;
pub mod factory;
pub mod stats;
pub mod store;

pub use entry::{BufferMode, CacheEntry, ContentSnapshot, NegativeEntry};
pub use factory::{CachingContentFactory, Content};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::CacheStore;
