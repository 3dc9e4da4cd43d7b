#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;
mod telemetry;
mod worker;

use std::process;

use anyhow::Context;
use axum::Router;
use starkbyte_server::handler::routes;
use starkbyte_server::middleware::RouterExt;
use starkbyte_server::service::{ServiceConfig, ServiceState};
use tokio_util::sync::CancellationToken;

use crate::config::{Cli, ServerConfig};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "starkbyte_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "starkbyte_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "starkbyte_cli::config";
pub const TRACING_TARGET_WORKER: &str = "starkbyte_cli::worker";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing(&cli.telemetry)?;
    cli.validate()?;
    cli.log();

    let state = create_service_state(&cli.service).await?;
    let router = create_router(state.clone(), &cli.server);

    let shutdown = CancellationToken::new();
    let cleanup = worker::spawn_cleanup_worker(
        state.account_service.clone(),
        cli.worker.cleanup_interval(),
        shutdown.child_token(),
    );

    let served = server::serve(router, cli.server, shutdown.clone()).await;

    // The server may also stop on an error; the worker goes down with it.
    shutdown.cancel();
    if let Err(error) = cleanup.await {
        tracing::warn!(
            target: TRACING_TARGET_WORKER,
            error = %error,
            "cleanup worker did not stop cleanly"
        );
    }

    served.context("server terminated with an error")
}

/// Creates the service state from configuration.
async fn create_service_state(config: &ServiceConfig) -> anyhow::Result<ServiceState> {
    ServiceState::new(config)
        .await
        .context("failed to create service state")
}

/// Creates the router with all middleware layers applied.
///
/// Observability wraps error handling, so timeouts and panics are traced
/// with their request id.
fn create_router(state: ServiceState, server: &ServerConfig) -> Router {
    routes(state.clone())
        .with_state(state)
        .with_error_handling_layer(server.request_timeout())
        .with_observability_layer()
}
