use std::fmt;
use std::sync::Arc;

use serde_json::json;
use starkbyte_service::{AuditAction, AuditEvent, AuditService};
use uuid::Uuid;

use crate::service::store::{CredentialStore, ProfileUpdate, UserRecord};
use crate::tracing_targets::TRACING_TARGET_ADMIN;
use crate::{Error, Result};

/// User listing, profile edits, role assignment and deletion.
#[derive(Clone)]
pub struct UserAdmin {
    store: Arc<dyn CredentialStore>,
    audit: AuditService,
}

impl UserAdmin {
    pub fn new(store: Arc<dyn CredentialStore>, audit: AuditService) -> Self {
        Self { store, audit }
    }

    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<UserRecord>> {
        self.store.list_users(limit, offset).await
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<UserRecord> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))
    }

    /// Applies a profile update. The email and role are not editable here.
    pub async fn update_profile(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<UserRecord> {
        if let Some(full_name) = &update.full_name
            && full_name.trim().is_empty()
        {
            return Err(Error::invalid("Full name cannot be empty"));
        }

        if update.is_empty() {
            return self.get_user(user_id).await;
        }

        let user = self
            .store
            .update_user_profile(user_id, update)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;

        tracing::info!(
            target: TRACING_TARGET_ADMIN,
            actor_id = %actor_id,
            user_id = %user.id,
            "user profile updated"
        );
        self.record(AuditAction::UserUpdated, actor_id, json!({ "userId": user.id }));

        Ok(user)
    }

    /// Moves a user to another role.
    pub async fn assign_role(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<UserRecord> {
        let user = self
            .store
            .assign_user_role(user_id, role_id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;

        tracing::info!(
            target: TRACING_TARGET_ADMIN,
            actor_id = %actor_id,
            user_id = %user.id,
            role_id = %role_id,
            "user role assigned"
        );
        self.record(
            AuditAction::UserRoleAssigned,
            actor_id,
            json!({ "userId": user.id, "roleId": role_id }),
        );

        Ok(user)
    }

    pub async fn delete_user(&self, actor_id: Uuid, user_id: Uuid) -> Result<()> {
        if !self.store.delete_user(user_id).await? {
            return Err(Error::not_found("User not found"));
        }

        tracing::info!(
            target: TRACING_TARGET_ADMIN,
            actor_id = %actor_id,
            user_id = %user_id,
            "user deleted"
        );
        self.record(AuditAction::UserDeleted, actor_id, json!({ "userId": user_id }));

        Ok(())
    }

    fn record(&self, action: AuditAction, actor_id: Uuid, metadata: serde_json::Value) {
        let event = AuditEvent::new(action)
            .with_actor(actor_id)
            .with_metadata(metadata);
        drop(self.audit.record(event));
    }
}

impl fmt::Debug for UserAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAdmin").finish_non_exhaustive()
    }
}
