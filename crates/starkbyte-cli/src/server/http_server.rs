//! HTTP server startup.

use std::io;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::lifecycle::serve_with_shutdown;
use super::shutdown::shutdown_signal;
use crate::TRACING_TARGET_SERVER_STARTUP;
use crate::config::ServerConfig;

/// Binds to the configured address and serves `app` until shutdown.
///
/// In-flight requests get up to the configured shutdown timeout to finish
/// once a signal arrives.
///
/// # Errors
///
/// Returns an error if the address cannot be bound, the server fails, or
/// in-flight requests outlive the shutdown timeout.
pub async fn serve(app: Router, config: ServerConfig, shutdown: CancellationToken) -> io::Result<()> {
    let server_addr = config.server_addr();
    let listener = TcpListener::bind(server_addr).await.inspect_err(|e| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %server_addr,
            error = %e,
            "failed to bind to address"
        );
    })?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %server_addr,
        "server is listening for connections"
    );

    let shutdown_timeout = config.shutdown_timeout();
    serve_with_shutdown(&config, shutdown.clone(), || async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal(shutdown, shutdown_timeout))
        .await
    })
    .await
}
