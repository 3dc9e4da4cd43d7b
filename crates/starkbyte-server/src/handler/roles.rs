//! Role administration handlers.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use validator::Validate;

use crate::extract::{AuthState, Json, Path};
use crate::handler::Result;
use crate::handler::request::{CreateRole, RolePathParams, UpdateRole};
use crate::handler::response::Role;
use crate::service::auth::{Permission, require_permission};
use crate::service::{RoleAdmin, ServiceState};

#[tracing::instrument(skip_all)]
async fn list_roles(
    State(roles): State<RoleAdmin>,
    AuthState(session): AuthState,
) -> Result<Json<Vec<Role>>> {
    require_permission(&session.principal, Permission::ViewRoles)?;

    let roles = roles.list_roles().await?;
    Ok(Json(roles.into_iter().map(Role::from_record).collect()))
}

#[tracing::instrument(skip_all, fields(role_id = %path_params.role_id))]
async fn get_role(
    State(roles): State<RoleAdmin>,
    AuthState(session): AuthState,
    Path(path_params): Path<RolePathParams>,
) -> Result<Json<Role>> {
    require_permission(&session.principal, Permission::ViewRoles)?;

    let role = roles.get_role(path_params.role_id).await?;
    Ok(Json(Role::from_record(role)))
}

#[tracing::instrument(skip_all)]
async fn create_role(
    State(roles): State<RoleAdmin>,
    AuthState(session): AuthState,
    Json(request): Json<CreateRole>,
) -> Result<(StatusCode, Json<Role>)> {
    require_permission(&session.principal, Permission::CreateRoles)?;
    request.validate()?;

    let role = roles
        .create_role(session.principal.user_id, &request.name, &request.permissions)
        .await?;

    Ok((StatusCode::CREATED, Json(Role::from_record(role))))
}

#[tracing::instrument(skip_all, fields(role_id = %path_params.role_id))]
async fn update_role(
    State(roles): State<RoleAdmin>,
    AuthState(session): AuthState,
    Path(path_params): Path<RolePathParams>,
    Json(request): Json<UpdateRole>,
) -> Result<Json<Role>> {
    require_permission(&session.principal, Permission::EditRoles)?;
    request.validate()?;

    let role = roles
        .update_role(
            session.principal.user_id,
            path_params.role_id,
            request.into_update(),
        )
        .await?;

    Ok(Json(Role::from_record(role)))
}

#[tracing::instrument(skip_all, fields(role_id = %path_params.role_id))]
async fn delete_role(
    State(roles): State<RoleAdmin>,
    AuthState(session): AuthState,
    Path(path_params): Path<RolePathParams>,
) -> Result<StatusCode> {
    require_permission(&session.principal, Permission::DeleteRoles)?;

    roles
        .delete_role(session.principal.user_id, path_params.role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns a [`Router`] with all related routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/roles", get(list_roles).post(create_role))
        .route(
            "/roles/{roleId}",
            get(get_role).patch(update_role).delete(delete_role),
        )
}
