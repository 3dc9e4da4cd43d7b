//! Role and permission request types.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::service::store::RoleUpdate;

/// Creates a role with an initial permission set.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRole {
    #[validate(length(min = 1, max = 64))]
    pub name: String,

    /// Permission names; every one must exist.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Renames a role and/or replaces its whole permission set.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRole {
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,

    /// Replaces, never merges.
    pub permissions: Option<Vec<String>>,
}

impl UpdateRole {
    pub fn into_update(self) -> RoleUpdate {
        RoleUpdate {
            name: self.name,
            permissions: self.permissions,
        }
    }
}

/// Creates or renames a permission.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PermissionName {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}
