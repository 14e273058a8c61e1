// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;

mod connection_loop;
mod context;
mod handler;
mod initialization;
mod metrics_server;
mod spawner;

pub use connection_loop::router;
pub use context::AppState;

/// The main server startup function, orchestrating all setup phases.
pub async fn run(config: Config) -> Result<()> {
    // 1. Build the authority, the cache, and the listener.
    let mut server_context = initialization::setup(config).await?;

    // 2. Spawn all background tasks.
    spawner::spawn_all(&mut server_context);

    // 3. Serve until shutdown.
    connection_loop::run(server_context).await
}
