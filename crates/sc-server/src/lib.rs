//! sc-server: HTTP API and folder watch loop.
//!
//! This crate ties the conversion pipeline from `sc-av` to the outside
//! world. It provides:
//!
//! - Axum-based HTTP API for uploads and watch control
//! - The polling watch loop ([`watcher::WatchController`])
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod watcher;

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

pub use crate::context::AppContext;

/// Start the silkconv server.
///
/// Binds `server.host:server.port`, serves until SIGINT/SIGTERM, and stops
/// the watch loop on the way out.
pub async fn start(ctx: AppContext) -> sc_core::Result<()> {
    for warning in ctx.config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let addr: SocketAddr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port)
        .parse()
        .map_err(|e| sc_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| sc_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Starting server on {addr}");
    serve(listener, ctx, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// Starts the watch loop first when `watch.enabled` is set.
pub async fn serve(
    listener: TcpListener,
    ctx: AppContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> sc_core::Result<()> {
    if ctx.config.watch.enabled {
        ctx.watch.start().await?;
    }

    tracing::info!(
        upload_dir = %ctx.upload_dir.display(),
        watch_input = %ctx.watch.input_dir().display(),
        watch_output = %ctx.watch.output_dir().display(),
        termux = ctx.platform.termux,
        "Ready"
    );

    let app = router::build_router(ctx.clone());
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    ctx.watch.shutdown().await;
    served?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
