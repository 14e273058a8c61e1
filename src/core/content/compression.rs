// src/core/content/compression.rs

//! Precompressed content variants that may sit next to a resource on disk.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// A precompressed representation of a resource, discovered as a sibling file
/// (e.g. `app.js.br` next to `app.js`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CompressedFormat {
    #[serde(alias = "br")]
    #[strum(to_string = "br", serialize = "brotli")]
    Brotli,
    #[serde(alias = "gz")]
    #[strum(to_string = "gzip", serialize = "gz")]
    Gzip,
    #[serde(alias = "zst")]
    #[strum(to_string = "zstd", serialize = "zst")]
    Zstd,
}

impl CompressedFormat {
    /// The `Content-Encoding` token for this format.
    pub fn encoding(&self) -> &'static str {
        match self {
            CompressedFormat::Brotli => "br",
            CompressedFormat::Gzip => "gzip",
            CompressedFormat::Zstd => "zstd",
        }
    }

    /// The file extension appended to the resource path for this variant.
    pub fn extension(&self) -> &'static str {
        match self {
            CompressedFormat::Brotli => ".br",
            CompressedFormat::Gzip => ".gz",
            CompressedFormat::Zstd => ".zst",
        }
    }
}
