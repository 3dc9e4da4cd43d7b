//! Authentication response types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::auth::{Principal, UserProfile};

/// Uniform answer of registration and reset requests.
///
/// Identical whether or not the email was already known.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accepted {
    pub message: String,
}

impl Accepted {
    pub fn registration() -> Self {
        Self {
            message: "If the email can be registered, the account is ready to sign in.".to_owned(),
        }
    }

    pub fn password_reset() -> Self {
        Self {
            message: "If the email belongs to an account, a reset link has been sent.".to_owned(),
        }
    }
}

/// Returned by a successful login.
///
/// `token` is only present for the bearer carrier; the cookie carrier sets
/// the session cookie instead.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedIn {
    pub user_id: Uuid,
    pub token_id: Uuid,
    pub expires_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// The caller as resolved for this request.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Me {
    pub user_id: Uuid,
    pub email: String,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub role_id: Uuid,
    pub role_name: String,
    /// Sorted permission names; may contain `*`.
    pub permissions: Vec<String>,
}

impl Me {
    pub fn from_principal(principal: Principal) -> Self {
        Self {
            permissions: principal.permissions.to_sorted_vec(),
            user_id: principal.user_id,
            email: principal.email,
            profile: principal.profile,
            role_id: principal.role_id,
            role_name: principal.role_name,
        }
    }
}
