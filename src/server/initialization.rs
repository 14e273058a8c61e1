// src/server/initialization.rs

//! Builds the authority, the caching factory, and the listener before the
//! serving loop starts.

use super::context::{AppState, ServerContext};
use crate::config::Config;
use crate::core::CachingContentFactory;
use crate::core::authority::FileSystemAuthority;
use anyhow::{Result, anyhow};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Initializes all server components before starting the main loop.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let root = std::path::Path::new(&config.root_dir);
    let root_meta = tokio::fs::metadata(root)
        .await
        .map_err(|e| anyhow!("Cannot open content root '{}': {}", root.display(), e))?;
    if !root_meta.is_dir() {
        return Err(anyhow!(
            "Content root '{}' is not a directory",
            root.display()
        ));
    }

    let authority = Arc::new(FileSystemAuthority::new(
        root,
        config.authority.clone(),
    ));
    let factory = CachingContentFactory::new(authority, &config.cache);
    info!("Content cache initialized.");

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(
        "contentcache serving '{}' on {}:{}",
        config.root_dir, config.host, config.port
    );

    Ok(ServerContext {
        state: Arc::new(AppState { config, factory }),
        listener,
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}

/// Logs key configuration parameters at startup.
fn log_startup_info(config: &Config) {
    let cache = &config.cache;
    if cache.max_cached_files == 0 {
        warn!("WARNING: cache.max_cached_files is 0. Every request will hit the filesystem.");
    } else {
        info!(
            "Cache limits: {} files, {:.2} MB total, {:.2} MB per file ({:?} buffers).",
            cache.max_cached_files,
            cache.max_cache_size as f64 / 1024.0 / 1024.0,
            cache.max_cached_file_size as f64 / 1024.0 / 1024.0,
            cache.buffer_mode
        );
    }
    if config.authority.file_mapping {
        info!("Serving file bodies from memory-mapped files.");
    }
}
