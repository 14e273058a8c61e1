// src/server/context.rs

use crate::config::Config;
use crate::core::CachingContentFactory;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

/// Shared state handed to every request handler.
pub struct AppState {
    pub config: Config,
    pub factory: CachingContentFactory,
}

/// Holds all the initialized state required to run the server's main loop.
pub struct ServerContext {
    pub state: Arc<AppState>,
    pub listener: TcpListener,
    pub shutdown_tx: broadcast::Sender<()>,
    pub background_tasks: JoinSet<Result<(), anyhow::Error>>,
}
