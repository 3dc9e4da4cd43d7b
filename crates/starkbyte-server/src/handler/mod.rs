//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use starkbyte_server::handler::routes;
//! use starkbyte_server::service::{ServiceConfig, ServiceState};
//!
//! # async fn example(config: ServiceConfig) -> anyhow::Result<()> {
//! let state = ServiceState::new(&config).await?;
//! let router: axum::Router = routes(state.clone()).with_state(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod authentication;
mod error;
mod monitors;
mod permissions;
pub(crate) mod request;
mod response;
mod roles;
mod users;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::middleware::require_authentication;
use crate::service::ServiceState;

#[inline]
async fn fallback() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns a [`Router`] with all routes that need a session.
fn private_routes() -> Router<ServiceState> {
    Router::new()
        .merge(authentication::private_routes())
        .merge(users::routes())
        .merge(roles::routes())
        .merge(permissions::routes())
}

/// Returns a [`Router`] with all public routes.
fn public_routes() -> Router<ServiceState> {
    Router::new()
        .merge(authentication::public_routes())
        .merge(monitors::routes())
}

/// Returns a [`Router`] with all routes.
///
/// Private routes answer `401` before any handler runs when the request
/// carries no valid session.
pub fn routes(state: ServiceState) -> Router<ServiceState> {
    let require_authentication = from_fn_with_state(state, require_authentication);

    let private_router = private_routes().route_layer(require_authentication);
    let public_router = public_routes();

    Router::new()
        .merge(private_router)
        .merge(public_router)
        .fallback(fallback)
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use starkbyte_service::{
        AuditService, MailMessage, MailService, MockAuditProvider, MockMailProvider,
    };
    use uuid::Uuid;

    use crate::handler::routes;
    use crate::handler::response::LoggedIn;
    use crate::service::store::{CredentialStore, MemoryStore};
    use crate::service::{ServiceState, SessionCarrier, SessionConfig};

    pub const PASSWORD: &str = "correct horse";
    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const WAIT: Duration = Duration::from_secs(2);

    /// A running server over an in-memory store with recording providers.
    pub struct TestContext {
        pub server: TestServer,
        pub store: MemoryStore,
        pub mail: MockMailProvider,
        pub audit: MockAuditProvider,
    }

    impl TestContext {
        /// Sessions travel in the `Authorization` header.
        pub async fn bearer() -> anyhow::Result<Self> {
            Self::with_session(SessionConfig::new(SECRET).with_carrier(SessionCarrier::Bearer))
                .await
        }

        /// Sessions travel in the session cookie.
        pub async fn cookie() -> anyhow::Result<Self> {
            let mut session = SessionConfig::new(SECRET).with_carrier(SessionCarrier::Cookie);
            session.session_cookie_secure = false;
            Self::with_session(session).await
        }

        async fn with_session(session: SessionConfig) -> anyhow::Result<Self> {
            let store = MemoryStore::new();
            let mail = MockMailProvider::new();
            let audit = MockAuditProvider::new();

            let state = ServiceState::from_memory(
                store.clone(),
                AuditService::new(audit.clone()),
                MailService::new(mail.clone()),
                session,
            )
            .await?;
            let app = routes(state.clone()).with_state(state);
            let server = TestServer::new(app)?;

            Ok(Self {
                server,
                store,
                mail,
                audit,
            })
        }

        /// Waits for `sent` emails and returns the token of the latest reset email.
        pub async fn reset_token_from_mail(&self, sent: usize) -> anyhow::Result<String> {
            let outbox = self.mail.wait_for(sent, WAIT).await;
            let message = outbox
                .iter()
                .rev()
                .find(|m| m.subject.contains("Reset"))
                .ok_or_else(|| anyhow::anyhow!("no reset email"))?;
            token_from(message)
        }

        pub async fn user_id(&self, email: &str) -> anyhow::Result<Uuid> {
            let user = self
                .store
                .find_user_by_email(email)
                .await?
                .ok_or_else(|| anyhow::anyhow!("user {email} missing"))?;
            Ok(user.id)
        }
    }

    fn token_from(message: &MailMessage) -> anyhow::Result<String> {
        let start = message
            .body
            .find("token=")
            .ok_or_else(|| anyhow::anyhow!("no token in body"))?;
        Ok(message.body[start + 6..]
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect())
    }

    /// Registers `email` with [`PASSWORD`] and returns a bearer token.
    pub async fn register_and_login(ctx: &TestContext, email: &str) -> anyhow::Result<String> {
        ctx.server
            .post("/auth/register")
            .json(&json!({ "email": email, "password": PASSWORD, "fullName": "Test User" }))
            .await
            .assert_status(StatusCode::ACCEPTED);

        let response = ctx
            .server
            .post("/auth/login")
            .json(&json!({ "email": email, "password": PASSWORD }))
            .await;
        response.assert_status_ok();

        let logged_in: LoggedIn = response.json();
        logged_in
            .token
            .ok_or_else(|| anyhow::anyhow!("bearer login returned no token"))
    }

    /// Moves `email` into a fresh role holding exactly `permissions`.
    ///
    /// Missing permissions are created first.
    pub async fn grant(ctx: &TestContext, email: &str, permissions: &[&str]) -> anyhow::Result<Uuid> {
        let existing = ctx.store.list_permissions().await?;
        for name in permissions {
            if !existing.iter().any(|p| p.name == *name) {
                ctx.store.create_permission(name).await?;
            }
        }

        let names: Vec<String> = permissions.iter().map(|n| (*n).to_owned()).collect();
        let role_name = format!("role-{}", Uuid::now_v7().simple());
        let role = ctx.store.create_role(&role_name, &names).await?;

        let user_id = ctx.user_id(email).await?;
        ctx.store.assign_user_role(user_id, role.id).await?;
        Ok(role.id)
    }

    #[tokio::test]
    async fn handlers() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        assert!(ctx.server.is_running());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let response = ctx.server.get("/nowhere").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "not_found");
        Ok(())
    }

    #[tokio::test]
    async fn private_routes_reject_before_the_handler() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;

        for path in ["/users", "/roles", "/permissions", "/auth/me"] {
            let response = ctx.server.get(path).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
        }

        let events = ctx.audit.events().await;
        assert!(events.is_empty());
        Ok(())
    }
}
