// src/config.rs

//! Manages server configuration: loading, resolving size values, and validation.

use crate::core::cache::BufferMode;
use crate::core::content::CompressedFormat;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::warn;

/// A size as written in the config file: a plain byte count or a string with a
/// unit suffix such as `"512kb"`, `"128mb"` or `"1g"`.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum SizeConfig {
    Bytes(i64),
    String(String),
}

/// Limits and behaviour of the in-memory content cache.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Bodies larger than this are served uncached (unless file-mapped).
    pub max_cached_file_size: u64,
    /// The aggregate body bytes the cache may hold.
    pub max_cache_size: u64,
    /// The number of entries the cache may hold. `0` disables caching.
    pub max_cached_files: usize,
    /// Whether readers share cached buffers or receive copies.
    pub buffer_mode: BufferMode,
}

fn default_max_cached_file_size() -> SizeConfig {
    SizeConfig::Bytes(128 * 1024 * 1024)
}
fn default_max_cache_size() -> SizeConfig {
    SizeConfig::Bytes(256 * 1024 * 1024)
}
fn default_max_cached_files() -> i64 {
    2048
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cached_file_size: 128 * 1024 * 1024,
            max_cache_size: 256 * 1024 * 1024,
            max_cached_files: 2048,
            buffer_mode: BufferMode::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawCacheConfig {
    #[serde(default = "default_max_cached_file_size")]
    max_cached_file_size: SizeConfig,
    #[serde(default = "default_max_cache_size")]
    max_cache_size: SizeConfig,
    #[serde(default = "default_max_cached_files")]
    max_cached_files: i64,
    #[serde(default)]
    buffer_mode: BufferMode,
}

impl Default for RawCacheConfig {
    fn default() -> Self {
        Self {
            max_cached_file_size: default_max_cached_file_size(),
            max_cache_size: default_max_cache_size(),
            max_cached_files: default_max_cached_files(),
            buffer_mode: BufferMode::default(),
        }
    }
}

/// How the filesystem authority resolves content.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthorityConfig {
    /// Serve bodies from memory-mapped files instead of heap copies.
    pub file_mapping: bool,
    /// Heap-read bodies up to this size; larger files are left unloaded.
    pub max_buffered_file_size: u64,
    /// Precompressed sibling variants to look for, in preference order.
    pub precompressed: Vec<CompressedFormat>,
    /// Whether to compute weak ETags.
    pub etags: bool,
}

fn default_max_buffered_file_size() -> SizeConfig {
    SizeConfig::Bytes(16 * 1024 * 1024)
}
fn default_precompressed() -> Vec<CompressedFormat> {
    vec![CompressedFormat::Brotli, CompressedFormat::Gzip]
}
fn default_etags() -> bool {
    true
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            file_mapping: false,
            max_buffered_file_size: 16 * 1024 * 1024,
            precompressed: default_precompressed(),
            etags: default_etags(),
        }
    }
}

#[derive(Deserialize)]
struct RawAuthorityConfig {
    #[serde(default)]
    file_mapping: bool,
    #[serde(default = "default_max_buffered_file_size")]
    max_buffered_file_size: SizeConfig,
    #[serde(default = "default_precompressed")]
    precompressed: Vec<CompressedFormat>,
    #[serde(default = "default_etags")]
    etags: bool,
}

impl Default for RawAuthorityConfig {
    fn default() -> Self {
        Self {
            file_mapping: false,
            max_buffered_file_size: default_max_buffered_file_size(),
            precompressed: default_precompressed(),
            etags: default_etags(),
        }
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

/// A raw representation of the config file before validation and resolution.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_root_dir")]
    root_dir: String,
    #[serde(default)]
    cache: RawCacheConfig,
    #[serde(default)]
    authority: RawAuthorityConfig,
    #[serde(default)]
    metrics: MetricsConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_root_dir() -> String {
    "public".to_string()
}

/// Represents the final, validated, and resolved server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// The directory static content is served from.
    pub root_dir: String,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub authority: AuthorityConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            root_dir: default_root_dir(),
            cache: CacheConfig::default(),
            authority: AuthorityConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid config in '{path}'"))
    }

    /// Parses, resolves, and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw_config: RawConfig =
            toml::from_str(contents).context("Failed to parse TOML configuration")?;

        if raw_config.cache.max_cached_files < 0 {
            return Err(anyhow!(
                "cache.max_cached_files cannot be negative (got {})",
                raw_config.cache.max_cached_files
            ));
        }

        let config = Config {
            host: raw_config.host,
            port: raw_config.port,
            log_level: raw_config.log_level,
            root_dir: raw_config.root_dir,
            cache: CacheConfig {
                max_cached_file_size: resolve_size(
                    "cache.max_cached_file_size",
                    raw_config.cache.max_cached_file_size,
                )?,
                max_cache_size: resolve_size(
                    "cache.max_cache_size",
                    raw_config.cache.max_cache_size,
                )?,
                max_cached_files: usize::try_from(raw_config.cache.max_cached_files)
                    .context("cache.max_cached_files is too large")?,
                buffer_mode: raw_config.cache.buffer_mode,
            },
            authority: AuthorityConfig {
                file_mapping: raw_config.authority.file_mapping,
                max_buffered_file_size: resolve_size(
                    "authority.max_buffered_file_size",
                    raw_config.authority.max_buffered_file_size,
                )?,
                precompressed: raw_config.authority.precompressed,
                etags: raw_config.authority.etags,
            },
            metrics: raw_config.metrics,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the resolved configuration to ensure logical consistency.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.root_dir.trim().is_empty() {
            return Err(anyhow!("root_dir cannot be empty"));
        }

        if self.cache.max_cached_files == 0 {
            warn!("cache.max_cached_files is 0: the content cache is disabled.");
        }
        if self.cache.max_cached_file_size > self.cache.max_cache_size {
            warn!(
                "cache.max_cached_file_size ({} bytes) exceeds cache.max_cache_size ({} bytes); files above the total limit will never be cached.",
                self.cache.max_cached_file_size, self.cache.max_cache_size
            );
        }

        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(anyhow!("metrics.port cannot be 0"));
            }
            if self.metrics.port == self.port {
                return Err(anyhow!(
                    "metrics.port cannot be the same as the main server port"
                ));
            }
        }
        Ok(())
    }
}

/// Resolves a `SizeConfig` into a byte count.
fn resolve_size(name: &str, cfg: SizeConfig) -> Result<u64> {
    match cfg {
        SizeConfig::Bytes(b) => u64::try_from(b)
            .map_err(|_| anyhow!("{name} cannot be negative (got {b})")),
        SizeConfig::String(s) => {
            let s_lower = s.trim().to_lowercase();
            if let Some(val_str) = s_lower.strip_suffix("gb") {
                parse_size_string(name, &s, val_str, 1024 * 1024 * 1024)
            } else if let Some(val_str) = s_lower.strip_suffix('g') {
                parse_size_string(name, &s, val_str, 1024 * 1024 * 1024)
            } else if let Some(val_str) = s_lower.strip_suffix("mb") {
                parse_size_string(name, &s, val_str, 1024 * 1024)
            } else if let Some(val_str) = s_lower.strip_suffix('m') {
                parse_size_string(name, &s, val_str, 1024 * 1024)
            } else if let Some(val_str) = s_lower.strip_suffix("kb") {
                parse_size_string(name, &s, val_str, 1024)
            } else if let Some(val_str) = s_lower.strip_suffix('k') {
                parse_size_string(name, &s, val_str, 1024)
            } else if let Some(val_str) = s_lower.strip_suffix('b') {
                parse_size_string(name, &s, val_str, 1)
            } else {
                parse_size_string(name, &s, &s_lower, 1)
            }
        }
    }
}

/// Parses a string number with a unit already stripped and applies a multiplier.
fn parse_size_string(name: &str, original_str: &str, value_str: &str, multiplier: u64) -> Result<u64> {
    let value: u64 = value_str.trim().parse().with_context(|| {
        format!(
            "Invalid {name} value '{original_str}'. Must be a number of bytes or have a unit (e.g., '512kb', '128mb')."
        )
    })?;
    value.checked_mul(multiplier).ok_or_else(|| {
        anyhow!("{name} value '{original_str}' is too large")
    })
}
