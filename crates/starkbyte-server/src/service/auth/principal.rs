//! The authenticated identity of one request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PermissionSet;

/// Profile fields carried along with the principal. Opaque to authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Snapshot of a user, their role and the role's permissions.
///
/// Resolved from the store on every request and never cached, so role and
/// permission edits apply from the next request on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub profile: UserProfile,
    pub role_id: Uuid,
    pub role_name: String,
    pub permissions: PermissionSet,
}

impl Principal {
    /// Returns `true` if the permission set grants `name`.
    #[inline]
    pub fn can(&self, name: &str) -> bool {
        self.permissions.allows(name)
    }

    /// Returns `true` if this principal is the user `user_id`.
    #[inline]
    pub fn is_user(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}
