// src/core/content/mod.rs

//! Content descriptors: the metadata-plus-body contract shared by authority
//! results and cache entries.

pub mod compression;
pub mod descriptor;
pub mod http_date;
pub mod resolved;

pub use compression::CompressedFormat;
pub use descriptor::{BodyStorage, ContentDescriptor, Resource, ResourceKind};
pub use resolved::ResolvedContent;
