//! User response types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::auth::UserProfile;
use crate::service::store::UserRecord;

/// Represents a user. The password hash never leaves the service.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub role_id: Uuid,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn from_record(user: UserRecord) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            profile: user.profile,
            role_id: user.role_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// A page of users.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Users {
    pub items: Vec<User>,
    pub limit: i64,
    pub offset: i64,
}
