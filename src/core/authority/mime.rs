// src/core/authority/mime.rs

//! Maps file extensions to MIME types and their default character encodings.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

/// A known MIME type and the charset assumed for it when none is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MimeType {
    pub essence: &'static str,
    pub charset: Option<&'static str>,
}

const UTF8: Option<&str> = Some("utf-8");

static BY_EXTENSION: Lazy<HashMap<&'static str, MimeType>> = Lazy::new(|| {
    let table: &[(&str, &str, Option<&str>)] = &[
        ("html", "text/html", UTF8),
        ("htm", "text/html", UTF8),
        ("css", "text/css", UTF8),
        ("js", "text/javascript", UTF8),
        ("mjs", "text/javascript", UTF8),
        ("json", "application/json", None),
        ("map", "application/json", None),
        ("txt", "text/plain", UTF8),
        ("csv", "text/csv", UTF8),
        ("md", "text/markdown", UTF8),
        ("xml", "application/xml", UTF8),
        ("svg", "image/svg+xml", None),
        ("png", "image/png", None),
        ("jpg", "image/jpeg", None),
        ("jpeg", "image/jpeg", None),
        ("gif", "image/gif", None),
        ("webp", "image/webp", None),
        ("avif", "image/avif", None),
        ("ico", "image/x-icon", None),
        ("woff", "font/woff", None),
        ("woff2", "font/woff2", None),
        ("ttf", "font/ttf", None),
        ("otf", "font/otf", None),
        ("wasm", "application/wasm", None),
        ("pdf", "application/pdf", None),
        ("zip", "application/zip", None),
        ("gz", "application/gzip", None),
        ("mp4", "video/mp4", None),
        ("webm", "video/webm", None),
        ("mp3", "audio/mpeg", None),
        ("ogg", "audio/ogg", None),
        ("wav", "audio/wav", None),
    ];
    table
        .iter()
        .map(|&(ext, essence, charset)| (ext, MimeType { essence, charset }))
        .collect()
});

/// Looks up the MIME type for `path` by its extension, case-insensitively.
pub fn for_path(path: &Path) -> Option<MimeType> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    BY_EXTENSION.get(ext.as_str()).copied()
}
