//! User listing and management handlers.
//!
//! A user may always read, edit and delete their own record; acting on
//! someone else needs the matching permission.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use validator::Validate;

use crate::extract::{AuthState, Json, Path, Query};
use crate::handler::Result;
use crate::handler::request::{AssignRole, PaginationRequest, UpdateUser, UserPathParams};
use crate::handler::response::{User, Users};
use crate::service::auth::{Permission, require_ownership_or_permission, require_permission};
use crate::service::{ServiceState, UserAdmin};

#[tracing::instrument(skip_all)]
async fn list_users(
    State(users): State<UserAdmin>,
    AuthState(session): AuthState,
    Query(pagination): Query<PaginationRequest>,
) -> Result<Json<Users>> {
    require_permission(&session.principal, Permission::ViewUsers)?;

    let (limit, offset) = (pagination.limit(), pagination.offset());
    let items = users
        .list_users(limit, offset)
        .await?
        .into_iter()
        .map(User::from_record)
        .collect();

    Ok(Json(Users {
        items,
        limit,
        offset,
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %path_params.user_id))]
async fn get_user(
    State(users): State<UserAdmin>,
    AuthState(session): AuthState,
    Path(path_params): Path<UserPathParams>,
) -> Result<Json<User>> {
    require_ownership_or_permission(
        &session.principal,
        path_params.user_id,
        Permission::ViewUsers,
    )?;

    let user = users.get_user(path_params.user_id).await?;
    Ok(Json(User::from_record(user)))
}

#[tracing::instrument(skip_all, fields(user_id = %path_params.user_id))]
async fn update_user(
    State(users): State<UserAdmin>,
    AuthState(session): AuthState,
    Path(path_params): Path<UserPathParams>,
    Json(request): Json<UpdateUser>,
) -> Result<Json<User>> {
    require_ownership_or_permission(
        &session.principal,
        path_params.user_id,
        Permission::EditUsers,
    )?;
    request.validate()?;

    let user = users
        .update_profile(
            session.principal.user_id,
            path_params.user_id,
            request.into_update(),
        )
        .await?;

    Ok(Json(User::from_record(user)))
}

#[tracing::instrument(skip_all, fields(user_id = %path_params.user_id))]
async fn delete_user(
    State(users): State<UserAdmin>,
    AuthState(session): AuthState,
    Path(path_params): Path<UserPathParams>,
) -> Result<StatusCode> {
    require_ownership_or_permission(
        &session.principal,
        path_params.user_id,
        Permission::DeleteUsers,
    )?;

    users
        .delete_user(session.principal.user_id, path_params.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip_all, fields(user_id = %path_params.user_id))]
async fn assign_role(
    State(users): State<UserAdmin>,
    AuthState(session): AuthState,
    Path(path_params): Path<UserPathParams>,
    Json(request): Json<AssignRole>,
) -> Result<Json<User>> {
    // Ownership is not enough: users must not pick their own role.
    require_permission(&session.principal, Permission::EditUsers)?;
    request.validate()?;

    let user = users
        .assign_role(
            session.principal.user_id,
            path_params.user_id,
            request.role_id,
        )
        .await?;

    Ok(Json(User::from_record(user)))
}

/// Returns a [`Router`] with all related routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/{userId}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/{userId}/role", put(assign_role))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::handler::test::{TestContext, grant, register_and_login};

    #[tokio::test]
    async fn listing_needs_view_users() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let token = register_and_login(&ctx, "ada@example.com").await?;

        let response = ctx.server.get("/users").authorization_bearer(&token).await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "forbidden");

        grant(&ctx, "ada@example.com", &["view_users"]).await?;
        let response = ctx
            .server
            .get("/users")
            .add_query_param("limit", 10)
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();

        let page: Users = response.json();
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset, 0);
        assert_eq!(page.items.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn owners_reach_their_own_record_only() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let token = register_and_login(&ctx, "ada@example.com").await?;
        register_and_login(&ctx, "bob@example.com").await?;
        let ada = ctx.user_id("ada@example.com").await?;
        let bob = ctx.user_id("bob@example.com").await?;

        let response = ctx
            .server
            .get(&format!("/users/{ada}"))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let user: User = response.json();
        assert_eq!(user.email, "ada@example.com");

        ctx.server
            .get(&format!("/users/{bob}"))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        ctx.server
            .patch(&format!("/users/{bob}"))
            .authorization_bearer(&token)
            .json(&json!({ "city": "Paris" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        ctx.server
            .delete(&format!("/users/{bob}"))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        Ok(())
    }

    #[tokio::test]
    async fn owners_edit_their_profile() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let token = register_and_login(&ctx, "ada@example.com").await?;
        let ada = ctx.user_id("ada@example.com").await?;

        let response = ctx
            .server
            .patch(&format!("/users/{ada}"))
            .authorization_bearer(&token)
            .json(&json!({ "city": "London", "country": "UK" }))
            .await;
        response.assert_status_ok();
        let user: User = response.json();
        assert_eq!(user.profile.city.as_deref(), Some("London"));

        let response = ctx
            .server
            .patch(&format!("/users/{ada}"))
            .authorization_bearer(&token)
            .json(&json!({ "city": null }))
            .await;
        response.assert_status_ok();
        let user: User = response.json();
        assert_eq!(user.profile.city, None);
        assert_eq!(user.profile.country.as_deref(), Some("UK"));
        Ok(())
    }

    #[tokio::test]
    async fn self_deletion_ends_the_session() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let token = register_and_login(&ctx, "ada@example.com").await?;
        let ada = ctx.user_id("ada@example.com").await?;

        ctx.server
            .delete(&format!("/users/{ada}"))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        // The token still verifies, but its principal is gone.
        ctx.server
            .get("/auth/me")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn role_assignment_needs_edit_users() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let token = register_and_login(&ctx, "ada@example.com").await?;
        let ada = ctx.user_id("ada@example.com").await?;
        let admin_role = grant(&ctx, "ada@example.com", &["view_users"]).await?;

        ctx.server
            .put(&format!("/users/{ada}/role"))
            .authorization_bearer(&token)
            .json(&json!({ "roleId": admin_role }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let editor_role = grant(&ctx, "ada@example.com", &["edit_users"]).await?;
        register_and_login(&ctx, "bob@example.com").await?;
        let bob = ctx.user_id("bob@example.com").await?;

        let response = ctx
            .server
            .put(&format!("/users/{bob}/role"))
            .authorization_bearer(&token)
            .json(&json!({ "roleId": editor_role }))
            .await;
        response.assert_status_ok();
        let user: User = response.json();
        assert_eq!(user.role_id, editor_role);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_user_id_is_a_client_error() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let token = register_and_login(&ctx, "ada@example.com").await?;

        let response = ctx
            .server
            .get("/users/not-a-uuid")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        Ok(())
    }
}
