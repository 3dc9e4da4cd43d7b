//! Health check handler.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;

use crate::extract::{AuthState, Json};
use crate::handler::response::Health;
use crate::service::{HealthCache, ServiceState};
use crate::tracing_targets::TRACING_TARGET_HANDLER;

#[tracing::instrument(skip_all, fields(authenticated = auth_state.is_some()))]
async fn health_status(
    State(health_cache): State<HealthCache>,
    auth_state: Option<AuthState>,
) -> (StatusCode, Json<Health>) {
    let healthy = health_cache.is_healthy().await;

    tracing::debug!(
        target: TRACING_TARGET_HANDLER,
        authenticated = auth_state.is_some(),
        healthy,
        "health status checked"
    );

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(Health { healthy }))
}

/// Returns a [`Router`] with all related routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/health", get(health_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test::TestContext;

    #[tokio::test]
    async fn in_memory_service_is_healthy() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;

        let response = ctx.server.get("/health").await;
        response.assert_status_ok();
        let health: Health = response.json();
        assert!(health.healthy);

        // A bad token does not turn the public route into a 401.
        let response = ctx
            .server
            .get("/health")
            .authorization_bearer("garbage")
            .await;
        response.assert_status_ok();
        Ok(())
    }
}
