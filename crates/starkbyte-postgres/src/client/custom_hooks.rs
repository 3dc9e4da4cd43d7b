//! Connection setup and pool lifecycle hooks.

use std::time::Instant;

use deadpool::managed::{HookResult, Metrics};
use diesel::ConnectionResult;
use diesel_async::pooled_connection::{PoolError, PoolableConnection};
use diesel_async::{AsyncConnection, AsyncPgConnection};
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::{PgConfig, TRACING_TARGET_CONNECTION};

/// Opens a connection, logging how long the handshake took.
///
/// Installed as the manager's `custom_setup` so failed handshakes are logged
/// with a masked URL instead of the raw credentials.
pub fn setup_callback<C>(url: &str) -> BoxFuture<'_, ConnectionResult<C>>
where
    C: AsyncConnection + 'static,
{
    async move {
        let started = Instant::now();
        let result = C::establish(url).await;
        let elapsed_ms = started.elapsed().as_millis();

        if let Err(err) = &result {
            tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                url = %PgConfig::mask_url(url),
                elapsed_ms,
                error = %err,
                "postgres handshake failed"
            );
        } else {
            tracing::debug!(target: TRACING_TARGET_CONNECTION, elapsed_ms, "postgres connection opened");
        }

        result
    }
    .boxed()
}

pub fn post_create(conn: &mut AsyncPgConnection, _: &Metrics) -> HookResult<PoolError> {
    if conn.is_broken() {
        tracing::warn!(target: TRACING_TARGET_CONNECTION, "fresh connection is already broken");
    }
    Ok(())
}

pub fn post_recycle(conn: &mut AsyncPgConnection, metrics: &Metrics) -> HookResult<PoolError> {
    if conn.is_broken() {
        tracing::warn!(
            target: TRACING_TARGET_CONNECTION,
            recycle_count = metrics.recycle_count,
            "recycled connection is broken"
        );
    }
    Ok(())
}
