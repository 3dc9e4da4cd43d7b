//! Process signals that start a graceful shutdown.

use std::future::pending;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_SERVER_SHUTDOWN;

/// Resolves on Ctrl+C, SIGTERM or cancellation of `shutdown`, then cancels
/// `shutdown` so the cleanup worker stops alongside the listener.
pub async fn shutdown_signal(shutdown: CancellationToken, shutdown_timeout: Duration) {
    let reason = tokio::select! {
        () = interrupt() => "interrupt",
        () = terminate() => "terminate",
        () = shutdown.cancelled() => "cancelled",
    };

    shutdown.cancel();
    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        reason,
        drain_secs = shutdown_timeout.as_secs(),
        "draining in-flight requests"
    );
}

async fn interrupt() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %err,
            "ctrl+c handler unavailable"
        );
        pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            tracing::error!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                error = %err,
                "sigterm handler unavailable"
            );
            pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    pending::<()>().await;
}
