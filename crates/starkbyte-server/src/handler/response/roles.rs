//! Role and permission response types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::store::{PermissionRecord, RoleRecord};

/// A role with its permission names.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role_id: Uuid,
    pub name: String,
    /// Sorted permission names.
    pub permissions: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Role {
    pub fn from_record(role: RoleRecord) -> Self {
        Self {
            role_id: role.id,
            name: role.name,
            permissions: role.permissions,
            created_at: role.created_at,
            updated_at: role.updated_at,
        }
    }
}

/// A named capability.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub permission_id: Uuid,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Permission {
    pub fn from_record(permission: PermissionRecord) -> Self {
        Self {
            permission_id: permission.id,
            name: permission.name,
            created_at: permission.created_at,
            updated_at: permission.updated_at,
        }
    }
}
