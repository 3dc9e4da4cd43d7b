use std::fmt;
use std::sync::Arc;

use serde_json::json;
use starkbyte_service::{AuditAction, AuditEvent, AuditService};
use uuid::Uuid;

use super::validate_name;
use crate::service::store::{
    CredentialStore, PermissionRecord, RoleDeletion, RoleRecord, RoleUpdate,
};
use crate::tracing_targets::TRACING_TARGET_ADMIN;
use crate::{Error, Result};

/// Role and permission administration.
#[derive(Clone)]
pub struct RoleAdmin {
    store: Arc<dyn CredentialStore>,
    audit: AuditService,
}

impl RoleAdmin {
    pub fn new(store: Arc<dyn CredentialStore>, audit: AuditService) -> Self {
        Self { store, audit }
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleRecord>> {
        self.store.list_roles().await
    }

    pub async fn get_role(&self, role_id: Uuid) -> Result<RoleRecord> {
        self.store
            .find_role(role_id)
            .await?
            .ok_or_else(|| Error::not_found("Role not found"))
    }

    /// Creates a role holding exactly `permissions`.
    ///
    /// Fails with `Conflict` on a taken name and `Invalid` if any permission
    /// name does not exist; nothing is written in either case.
    pub async fn create_role(
        &self,
        actor_id: Uuid,
        name: &str,
        permissions: &[String],
    ) -> Result<RoleRecord> {
        let name = validate_name("Role", name)?;
        let role = self.store.create_role(&name, permissions).await?;

        tracing::info!(
            target: TRACING_TARGET_ADMIN,
            actor_id = %actor_id,
            role_id = %role.id,
            role = %role.name,
            permissions = role.permissions.len(),
            "role created"
        );
        self.record(
            AuditAction::RoleCreated,
            actor_id,
            json!({ "roleId": role.id, "name": role.name, "permissions": role.permissions }),
        );

        Ok(role)
    }

    /// Renames the role and/or replaces its whole permission set.
    pub async fn update_role(
        &self,
        actor_id: Uuid,
        role_id: Uuid,
        update: RoleUpdate,
    ) -> Result<RoleRecord> {
        let update = RoleUpdate {
            name: update
                .name
                .as_deref()
                .map(|name| validate_name("Role", name))
                .transpose()?,
            permissions: update.permissions,
        };
        let replaced = update.permissions.is_some();

        let role = self
            .store
            .update_role(role_id, update)
            .await?
            .ok_or_else(|| Error::not_found("Role not found"))?;

        tracing::info!(
            target: TRACING_TARGET_ADMIN,
            actor_id = %actor_id,
            role_id = %role.id,
            role = %role.name,
            replaced_permissions = replaced,
            "role updated"
        );
        self.record(
            AuditAction::RoleUpdated,
            actor_id,
            json!({ "roleId": role.id, "name": role.name, "permissions": role.permissions }),
        );

        Ok(role)
    }

    /// Deletes a role nobody holds. Fails with `InUse` otherwise.
    pub async fn delete_role(&self, actor_id: Uuid, role_id: Uuid) -> Result<()> {
        match self.store.delete_role_if_unused(role_id).await? {
            RoleDeletion::Deleted => {
                tracing::info!(
                    target: TRACING_TARGET_ADMIN,
                    actor_id = %actor_id,
                    role_id = %role_id,
                    "role deleted"
                );
                self.record(
                    AuditAction::RoleDeleted,
                    actor_id,
                    json!({ "roleId": role_id }),
                );
                Ok(())
            }
            RoleDeletion::NotFound => Err(Error::not_found("Role not found")),
            RoleDeletion::InUse(holders) => {
                tracing::warn!(
                    target: TRACING_TARGET_ADMIN,
                    actor_id = %actor_id,
                    role_id = %role_id,
                    holders,
                    "role deletion blocked"
                );
                Err(Error::in_use(format!(
                    "Role is assigned to {holders} user(s)"
                )))
            }
        }
    }

    pub async fn list_permissions(&self) -> Result<Vec<PermissionRecord>> {
        self.store.list_permissions().await
    }

    pub async fn create_permission(&self, actor_id: Uuid, name: &str) -> Result<PermissionRecord> {
        let name = validate_name("Permission", name)?;
        let permission = self.store.create_permission(&name).await?;

        tracing::info!(
            target: TRACING_TARGET_ADMIN,
            actor_id = %actor_id,
            permission_id = %permission.id,
            permission = %permission.name,
            "permission created"
        );
        self.record(
            AuditAction::PermissionCreated,
            actor_id,
            json!({ "permissionId": permission.id, "name": permission.name }),
        );

        Ok(permission)
    }

    pub async fn update_permission(
        &self,
        actor_id: Uuid,
        permission_id: Uuid,
        name: &str,
    ) -> Result<PermissionRecord> {
        let name = validate_name("Permission", name)?;
        let permission = self
            .store
            .update_permission(permission_id, &name)
            .await?
            .ok_or_else(|| Error::not_found("Permission not found"))?;

        tracing::info!(
            target: TRACING_TARGET_ADMIN,
            actor_id = %actor_id,
            permission_id = %permission.id,
            permission = %permission.name,
            "permission renamed"
        );
        self.record(
            AuditAction::PermissionUpdated,
            actor_id,
            json!({ "permissionId": permission.id, "name": permission.name }),
        );

        Ok(permission)
    }

    /// Deletes a permission; roles holding it simply lose it.
    pub async fn delete_permission(&self, actor_id: Uuid, permission_id: Uuid) -> Result<()> {
        if !self.store.delete_permission(permission_id).await? {
            return Err(Error::not_found("Permission not found"));
        }

        tracing::info!(
            target: TRACING_TARGET_ADMIN,
            actor_id = %actor_id,
            permission_id = %permission_id,
            "permission deleted"
        );
        self.record(
            AuditAction::PermissionDeleted,
            actor_id,
            json!({ "permissionId": permission_id }),
        );

        Ok(())
    }

    fn record(&self, action: AuditAction, actor_id: Uuid, metadata: serde_json::Value) {
        let event = AuditEvent::new(action)
            .with_actor(actor_id)
            .with_metadata(metadata);
        drop(self.audit.record(event));
    }
}

impl fmt::Debug for RoleAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleAdmin").finish_non_exhaustive()
    }
}
