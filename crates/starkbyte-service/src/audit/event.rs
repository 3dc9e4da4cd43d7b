use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mutations that leave an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "user.register")]
    UserRegistered,
    #[serde(rename = "user.update")]
    UserUpdated,
    #[serde(rename = "user.delete")]
    UserDeleted,
    #[serde(rename = "user.assign_role")]
    UserRoleAssigned,
    #[serde(rename = "session.revoke")]
    SessionRevoked,
    #[serde(rename = "password.change")]
    PasswordChanged,
    #[serde(rename = "password.reset_request")]
    PasswordResetRequested,
    #[serde(rename = "password.reset")]
    PasswordReset,
    #[serde(rename = "role.create")]
    RoleCreated,
    #[serde(rename = "role.update")]
    RoleUpdated,
    #[serde(rename = "role.delete")]
    RoleDeleted,
    #[serde(rename = "permission.create")]
    PermissionCreated,
    #[serde(rename = "permission.update")]
    PermissionUpdated,
    #[serde(rename = "permission.delete")]
    PermissionDeleted,
}

impl AuditAction {
    /// Returns the dotted action name stored with the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRegistered => "user.register",
            Self::UserUpdated => "user.update",
            Self::UserDeleted => "user.delete",
            Self::UserRoleAssigned => "user.assign_role",
            Self::SessionRevoked => "session.revoke",
            Self::PasswordChanged => "password.change",
            Self::PasswordResetRequested => "password.reset_request",
            Self::PasswordReset => "password.reset",
            Self::RoleCreated => "role.create",
            Self::RoleUpdated => "role.update",
            Self::RoleDeleted => "role.delete",
            Self::PermissionCreated => "permission.create",
            Self::PermissionUpdated => "permission.update",
            Self::PermissionDeleted => "permission.delete",
        }
    }
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// User that performed the mutation, absent for anonymous flows.
    pub actor_id: Option<Uuid>,
    /// What happened.
    pub action: AuditAction,
    /// Action-specific details, such as the affected role id.
    pub metadata: serde_json::Value,
    /// When the mutation completed.
    pub occurred_at: Timestamp,
}

impl AuditEvent {
    /// Creates an anonymous event with empty metadata.
    pub fn new(action: AuditAction) -> Self {
        Self {
            actor_id: None,
            action,
            metadata: serde_json::Value::Object(Default::default()),
            occurred_at: Timestamp::now(),
        }
    }

    /// Sets the acting user.
    pub fn with_actor(mut self, actor_id: Uuid) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Replaces the metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_action_matches_as_str() -> anyhow::Result<()> {
        for action in [
            AuditAction::RoleCreated,
            AuditAction::PermissionDeleted,
            AuditAction::PasswordResetRequested,
        ] {
            let json = serde_json::to_value(action)?;
            assert_eq!(json, serde_json::Value::String(action.as_str().to_owned()));
        }
        Ok(())
    }

    #[test]
    fn builder_sets_actor_and_metadata() {
        let actor = Uuid::now_v7();
        let event = AuditEvent::new(AuditAction::RoleDeleted)
            .with_actor(actor)
            .with_metadata(serde_json::json!({ "role": "editor" }));

        assert_eq!(event.actor_id, Some(actor));
        assert_eq!(event.metadata["role"], "editor");
    }
}
