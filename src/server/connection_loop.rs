// src/server/connection_loop.rs

//! Runs the HTTP server and handles graceful shutdown.

use super::context::{AppState, ServerContext};
use super::handler::serve_content;
use anyhow::{Result, anyhow};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};

/// How long background tasks get to finish after shutdown is signalled.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Builds the router serving every path through the content cache.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_content))
        .route("/{*path}", get(serve_content))
        .with_state(state)
}

/// Serves requests until a signal or a failing background task stops the server.
pub async fn run(mut ctx: ServerContext) -> Result<()> {
    let app = router(ctx.state.clone());
    let mut http_shutdown_rx = ctx.shutdown_tx.subscribe();
    let listener = ctx.listener;
    ctx.background_tasks.spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                http_shutdown_rx.recv().await.ok();
                info!("HTTP server shutting down.");
            })
            .await?;
        Ok(())
    });

    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow!("Failed to register SIGINT handler: {}", e))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow!("Failed to register SIGTERM handler: {}", e))?;

    loop {
        tokio::select! {
            biased;

            _ = sigint.recv() => {
                info!("SIGINT received, initiating graceful shutdown.");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, initiating graceful shutdown.");
                break;
            }

            Some(res) = ctx.background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                    Ok(Err(e)) => { error!("CRITICAL: Background task failed: {}. Shutting down.", e); break; }
                    Err(e) => { error!("CRITICAL: Background task panicked: {e:?}. Shutting down."); break; }
                }
            },
        }
    }

    // Receivers may already be gone if their tasks exited.
    let _ = ctx.shutdown_tx.send(());
    let drain = async {
        while ctx.background_tasks.join_next().await.is_some() {}
    };
    if tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, drain).await.is_err() {
        warn!("Background tasks did not stop in time; aborting them.");
        ctx.background_tasks.abort_all();
    }

    info!(
        "Shutdown complete. {} entries ({} bytes) were cached.",
        ctx.state.factory.cached_files(),
        ctx.state.factory.cached_size()
    );
    Ok(())
}
