//! Serving until shutdown, with a bounded drain.

use std::future::Future;
use std::io;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Runs the server future, bounding the drain phase by the shutdown timeout.
///
/// Once `shutdown` is cancelled, the server has `shutdown_timeout` to finish
/// in-flight requests before this returns `TimedOut`.
pub async fn serve_with_shutdown<F>(
    config: &ServerConfig,
    shutdown: CancellationToken,
    serve_fn: impl FnOnce() -> F,
) -> io::Result<()>
where
    F: Future<Output = io::Result<()>>,
{
    let started = Instant::now();
    warn_if_public(config);

    let server = serve_fn();
    tokio::pin!(server);

    let result = tokio::select! {
        result = &mut server => result,
        () = shutdown.cancelled() => {
            match tokio::time::timeout(config.shutdown_timeout(), &mut server).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "in-flight requests did not finish before the shutdown timeout",
                )),
            }
        }
    };

    report_exit(result, started)
}

fn warn_if_public(config: &ServerConfig) {
    if config.is_public() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %config.server_addr(),
            "listening beyond loopback, session cookies travel over this interface"
        );
    }
}

fn report_exit(result: io::Result<()>, started: Instant) -> io::Result<()> {
    let uptime_secs = started.elapsed().as_secs();

    let Err(err) = result else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            uptime_secs,
            "server stopped"
        );
        return Ok(());
    };

    tracing::error!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        error = %err,
        kind = ?err.kind(),
        uptime_secs,
        hint = hint_for(&err),
        "server exited with an error"
    );
    Err(err)
}

/// Operator hint for the io errors a listener commonly hits.
fn hint_for(err: &io::Error) -> Option<&'static str> {
    let hint = match err.kind() {
        io::ErrorKind::PermissionDenied => "bind a port of 1024 or above",
        io::ErrorKind::AddrInUse => "another process holds this port, change --port",
        io::ErrorKind::AddrNotAvailable => "--host is not an address of this machine",
        io::ErrorKind::TimedOut => "requests outlived the drain, raise --shutdown-timeout",
        _ => return None,
    };
    Some(hint)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn clean_exit_is_ok() {
        let config = ServerConfig::default();
        let result = serve_with_shutdown(&config, CancellationToken::new(), || async { Ok(()) }).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn listener_error_is_returned() {
        let config = ServerConfig::default();
        let result = serve_with_shutdown(&config, CancellationToken::new(), || async {
            Err(io::Error::from(io::ErrorKind::AddrInUse))
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
        assert!(hint_for(&err).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_drain_times_out() {
        let config = ServerConfig {
            shutdown_timeout: 1,
            ..ServerConfig::default()
        };
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let result = serve_with_shutdown(&config, shutdown, || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
