//! Registration, login, logout and password handlers.
//!
//! Registration and forgot-password answer `202 Accepted` with the same body
//! whether or not the email is known.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};

use crate::extract::{AuthState, Json, SessionCookie, ValidateJson};
use crate::handler::Result;
use crate::handler::request::{ChangePassword, ForgotPassword, Login, Register, ResetPassword};
use crate::handler::response::{Accepted, LoggedIn, Me};
use crate::service::{AccountService, SessionCarrier, SessionCodec, ServiceState};
use crate::tracing_targets::TRACING_TARGET_HANDLER;

#[tracing::instrument(skip_all)]
async fn register(
    State(accounts): State<AccountService>,
    ValidateJson(request): ValidateJson<Register>,
) -> Result<(StatusCode, Json<Accepted>)> {
    accounts.register(request.into_registration()).await?;
    Ok((StatusCode::ACCEPTED, Json(Accepted::registration())))
}

#[tracing::instrument(skip_all)]
async fn login(
    State(accounts): State<AccountService>,
    State(codec): State<SessionCodec>,
    ValidateJson(request): ValidateJson<Login>,
) -> Result<(SessionCookie, Json<LoggedIn>)> {
    let issued = accounts.login(&request.email, &request.password).await?;

    let config = codec.config();
    let token = match config.session_carrier {
        SessionCarrier::Bearer => Some(issued.token.clone()),
        SessionCarrier::Cookie => None,
    };
    let body = LoggedIn {
        user_id: issued.claims.user_id,
        token_id: issued.claims.token_id,
        expires_at: issued.claims.expires_at(),
        token,
    };

    Ok((SessionCookie::set(config, issued.token), Json(body)))
}

#[tracing::instrument(skip_all)]
async fn logout(
    State(accounts): State<AccountService>,
    State(codec): State<SessionCodec>,
    AuthState(session): AuthState,
) -> Result<(SessionCookie, StatusCode)> {
    accounts.logout(&session.claims).await?;
    Ok((SessionCookie::clear(codec.config()), StatusCode::NO_CONTENT))
}

#[tracing::instrument(skip_all)]
async fn me(AuthState(session): AuthState) -> Json<Me> {
    Json(Me::from_principal(session.principal))
}

#[tracing::instrument(skip_all)]
async fn change_password(
    State(accounts): State<AccountService>,
    AuthState(session): AuthState,
    ValidateJson(request): ValidateJson<ChangePassword>,
) -> Result<StatusCode> {
    accounts
        .change_password(
            session.principal.user_id,
            &request.current_password,
            &request.new_password,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip_all)]
async fn forgot_password(
    State(accounts): State<AccountService>,
    ValidateJson(request): ValidateJson<ForgotPassword>,
) -> Result<(StatusCode, Json<Accepted>)> {
    accounts.request_password_reset(&request.email).await?;
    Ok((StatusCode::ACCEPTED, Json(Accepted::password_reset())))
}

#[tracing::instrument(skip_all)]
async fn reset_password(
    State(accounts): State<AccountService>,
    ValidateJson(request): ValidateJson<ResetPassword>,
) -> Result<StatusCode> {
    accounts
        .reset_password(&request.token, &request.new_password)
        .await?;

    tracing::debug!(target: TRACING_TARGET_HANDLER, "password reset completed");
    Ok(StatusCode::NO_CONTENT)
}

/// Routes reachable without a session.
pub fn public_routes() -> Router<ServiceState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

/// Routes that need a session.
pub fn private_routes() -> Router<ServiceState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/password", put(change_password))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::handler::test::{TestContext, register_and_login};

    #[tokio::test]
    async fn registration_answers_the_same_for_taken_emails() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let body = json!({
            "email": "ada@example.com",
            "password": "correct horse",
            "fullName": "Ada Lovelace",
        });

        let first = ctx.server.post("/auth/register").json(&body).await;
        let second = ctx.server.post("/auth/register").json(&body).await;

        first.assert_status(StatusCode::ACCEPTED);
        second.assert_status(StatusCode::ACCEPTED);
        assert_eq!(first.text(), second.text());

        // Only the first registration sends a welcome email.
        let outbox = ctx.mail.wait_for(2, Duration::from_millis(200)).await;
        assert_eq!(outbox.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_registration_is_rejected() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let response = ctx
            .server
            .post("/auth/register")
            .json(&json!({ "email": "nope", "password": "x", "fullName": "" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "invalid");
        Ok(())
    }

    #[tokio::test]
    async fn login_failure_is_unauthorized() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        register_and_login(&ctx, "ada@example.com").await?;

        let response = ctx
            .server
            .post("/auth/login")
            .json(&json!({ "email": "ada@example.com", "password": "wrong password" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "unauthorized");
        Ok(())
    }

    #[tokio::test]
    async fn me_requires_a_session() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;

        let response = ctx.server.get("/auth/me").await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = ctx
            .server
            .get("/auth/me")
            .authorization_bearer("not-a-token")
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn me_returns_the_principal() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let token = register_and_login(&ctx, "ada@example.com").await?;

        let response = ctx.server.get("/auth/me").authorization_bearer(&token).await;
        response.assert_status_ok();

        let me: Me = response.json();
        assert_eq!(me.email, "ada@example.com");
        assert_eq!(me.role_name, "user");
        assert!(me.permissions.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn logout_revokes_the_token() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let token = register_and_login(&ctx, "ada@example.com").await?;

        let response = ctx
            .server
            .post("/auth/logout")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = ctx.server.get("/auth/me").authorization_bearer(&token).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn cookie_carrier_sets_and_reads_the_cookie() -> anyhow::Result<()> {
        let ctx = TestContext::cookie().await?;
        ctx.server
            .post("/auth/register")
            .json(&json!({
                "email": "ada@example.com",
                "password": "correct horse",
                "fullName": "Ada Lovelace",
            }))
            .await
            .assert_status(StatusCode::ACCEPTED);

        let response = ctx
            .server
            .post("/auth/login")
            .json(&json!({ "email": "ada@example.com", "password": "correct horse" }))
            .await;
        response.assert_status_ok();

        let body: LoggedIn = response.json();
        assert!(body.token.is_none());
        let cookie = response.cookie("starkbyte_session");
        assert_eq!(cookie.http_only(), Some(true));

        let response = ctx.server.get("/auth/me").add_cookie(cookie.clone()).await;
        response.assert_status_ok();

        // A bearer header is ignored in cookie mode.
        let response = ctx
            .server
            .get("/auth/me")
            .authorization_bearer(cookie.value())
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn password_change_then_login_with_new_password() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let token = register_and_login(&ctx, "ada@example.com").await?;

        ctx.server
            .put("/auth/password")
            .authorization_bearer(&token)
            .json(&json!({ "currentPassword": "nope", "newPassword": "battery staple" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        ctx.server
            .put("/auth/password")
            .authorization_bearer(&token)
            .json(&json!({
                "currentPassword": "correct horse",
                "newPassword": "battery staple",
            }))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        ctx.server
            .post("/auth/login")
            .json(&json!({ "email": "ada@example.com", "password": "battery staple" }))
            .await
            .assert_status_ok();
        Ok(())
    }

    #[tokio::test]
    async fn forgot_password_then_reset_once() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        register_and_login(&ctx, "ada@example.com").await?;

        let unknown = ctx
            .server
            .post("/auth/forgot-password")
            .json(&json!({ "email": "nobody@example.com" }))
            .await;
        let known = ctx
            .server
            .post("/auth/forgot-password")
            .json(&json!({ "email": "ada@example.com" }))
            .await;
        unknown.assert_status(StatusCode::ACCEPTED);
        known.assert_status(StatusCode::ACCEPTED);
        assert_eq!(unknown.text(), known.text());

        // Welcome email, then the reset email for the known address.
        let token = ctx.reset_token_from_mail(2).await?;
        let reset = json!({ "token": token, "newPassword": "battery staple" });

        ctx.server
            .post("/auth/reset-password")
            .json(&reset)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let replay = ctx.server.post("/auth/reset-password").json(&reset).await;
        replay.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = replay.json();
        assert_eq!(body["name"], "invalid");
        Ok(())
    }
}
