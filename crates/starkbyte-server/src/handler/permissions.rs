//! Permission administration handlers.
//!
//! Deleting a permission detaches it from every role in the same step.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use validator::Validate;

use crate::extract::{AuthState, Json, Path};
use crate::handler::Result;
use crate::handler::request::{PermissionName, PermissionPathParams};
use crate::handler::response::Permission;
use crate::service::auth::{self, require_permission};
use crate::service::{RoleAdmin, ServiceState};

#[tracing::instrument(skip_all)]
async fn list_permissions(
    State(roles): State<RoleAdmin>,
    AuthState(session): AuthState,
) -> Result<Json<Vec<Permission>>> {
    require_permission(&session.principal, auth::Permission::ViewPermissions)?;

    let permissions = roles.list_permissions().await?;
    Ok(Json(
        permissions
            .into_iter()
            .map(Permission::from_record)
            .collect(),
    ))
}

#[tracing::instrument(skip_all)]
async fn create_permission(
    State(roles): State<RoleAdmin>,
    AuthState(session): AuthState,
    Json(request): Json<PermissionName>,
) -> Result<(StatusCode, Json<Permission>)> {
    require_permission(&session.principal, auth::Permission::CreatePermissions)?;
    request.validate()?;

    let permission = roles
        .create_permission(session.principal.user_id, &request.name)
        .await?;

    Ok((StatusCode::CREATED, Json(Permission::from_record(permission))))
}

#[tracing::instrument(skip_all, fields(permission_id = %path_params.permission_id))]
async fn update_permission(
    State(roles): State<RoleAdmin>,
    AuthState(session): AuthState,
    Path(path_params): Path<PermissionPathParams>,
    Json(request): Json<PermissionName>,
) -> Result<Json<Permission>> {
    require_permission(&session.principal, auth::Permission::EditPermissions)?;
    request.validate()?;

    let permission = roles
        .update_permission(
            session.principal.user_id,
            path_params.permission_id,
            &request.name,
        )
        .await?;

    Ok(Json(Permission::from_record(permission)))
}

#[tracing::instrument(skip_all, fields(permission_id = %path_params.permission_id))]
async fn delete_permission(
    State(roles): State<RoleAdmin>,
    AuthState(session): AuthState,
    Path(path_params): Path<PermissionPathParams>,
) -> Result<StatusCode> {
    require_permission(&session.principal, auth::Permission::DeletePermissions)?;

    roles
        .delete_permission(session.principal.user_id, path_params.permission_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns a [`Router`] with all related routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/permissions", get(list_permissions).post(create_permission))
        .route(
            "/permissions/{permissionId}",
            patch(update_permission).delete(delete_permission),
        )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::handler::response::Role;
    use crate::handler::test::{TestContext, grant, register_and_login};

    #[tokio::test]
    async fn permission_lifecycle() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let token = register_and_login(&ctx, "root@example.com").await?;
        grant(&ctx, "root@example.com", &["*"]).await?;

        let response = ctx
            .server
            .post("/permissions")
            .authorization_bearer(&token)
            .json(&json!({ "name": "view_news" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: Permission = response.json();

        ctx.server
            .post("/permissions")
            .authorization_bearer(&token)
            .json(&json!({ "name": "view_news" }))
            .await
            .assert_status(StatusCode::CONFLICT);

        let response = ctx
            .server
            .patch(&format!("/permissions/{}", created.permission_id))
            .authorization_bearer(&token)
            .json(&json!({ "name": "read_news" }))
            .await;
        response.assert_status_ok();
        let renamed: Permission = response.json();
        assert_eq!(renamed.name, "read_news");

        let response = ctx
            .server
            .get("/permissions")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let names: Vec<String> = response
            .json::<Vec<Permission>>()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert!(names.contains(&"read_news".to_owned()));
        assert!(!names.contains(&"view_news".to_owned()));
        Ok(())
    }

    #[tokio::test]
    async fn deletion_detaches_from_roles() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let token = register_and_login(&ctx, "root@example.com").await?;
        grant(&ctx, "root@example.com", &["*"]).await?;
        register_and_login(&ctx, "ada@example.com").await?;
        let role_id = grant(&ctx, "ada@example.com", &["view_news", "edit_news"]).await?;

        let permissions: Vec<Permission> = ctx
            .server
            .get("/permissions")
            .authorization_bearer(&token)
            .await
            .json();
        let edit_news = permissions
            .iter()
            .find(|p| p.name == "edit_news")
            .ok_or_else(|| anyhow::anyhow!("edit_news missing"))?;

        ctx.server
            .delete(&format!("/permissions/{}", edit_news.permission_id))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let role: Role = ctx
            .server
            .get(&format!("/roles/{role_id}"))
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(role.permissions, vec!["view_news"]);

        ctx.server
            .delete(&format!("/permissions/{}", edit_news.permission_id))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn management_needs_permissions() -> anyhow::Result<()> {
        let ctx = TestContext::bearer().await?;
        let token = register_and_login(&ctx, "ada@example.com").await?;

        ctx.server
            .get("/permissions")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        ctx.server
            .post("/permissions")
            .authorization_bearer(&token)
            .json(&json!({ "name": "view_news" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        Ok(())
    }
}
