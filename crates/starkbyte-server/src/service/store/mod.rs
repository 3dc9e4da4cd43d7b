//! Credential and revocation stores.
//!
//! [`CredentialStore`] is the persistence boundary of the authorization core.
//! Compound operations (`create_role`, `update_role`,
//! `delete_role_if_unused`) are atomic in every implementation: [`PgStore`]
//! runs them in one transaction, `MemoryStore` under one lock.

#[cfg(any(test, feature = "test-utils"))]
mod memory_store;
mod pg_audit;
mod pg_store;

use jiff::Timestamp;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use memory_store::MemoryStore;
pub use pg_audit::PgAuditProvider;
pub use pg_store::PgStore;
use serde::Serialize;
use uuid::Uuid;

use crate::{Error, Result};
use crate::service::auth::UserProfile;

/// Name of the role assigned to self-registered users.
pub const DEFAULT_ROLE: &str = "user";

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub profile: UserProfile,
    pub role_id: Uuid,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields for a new user. The store assigns the [`DEFAULT_ROLE`].
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    /// Already normalized email.
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
}

/// Self-service profile changes; `None` leaves a field untouched.
///
/// Nested options clear a field with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<Option<String>>,
    pub address_line: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub postal_code: Option<Option<String>>,
    pub country: Option<Option<String>>,
}

impl ProfileUpdate {
    /// Returns `true` if nothing would change.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub(crate) fn apply(self, profile: &mut UserProfile) {
        if let Some(full_name) = self.full_name {
            profile.full_name = full_name;
        }
        if let Some(phone) = self.phone {
            profile.phone = phone;
        }
        if let Some(address_line) = self.address_line {
            profile.address_line = address_line;
        }
        if let Some(city) = self.city {
            profile.city = city;
        }
        if let Some(postal_code) = self.postal_code {
            profile.postal_code = postal_code;
        }
        if let Some(country) = self.country {
            profile.country = country;
        }
    }
}

/// A role with its permission names, sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    pub id: Uuid,
    pub name: String,
    pub permissions: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Rename and/or permission replacement for a role.
#[derive(Debug, Clone, Default)]
pub struct RoleUpdate {
    pub name: Option<String>,
    /// Replaces the whole permission set when present.
    pub permissions: Option<Vec<String>>,
}

/// A stored permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRecord {
    pub id: Uuid,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A stored password reset token. Only the digest of the raw token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTokenRecord {
    pub token_digest: String,
    pub user_id: Uuid,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl ResetTokenRecord {
    /// Returns `true` once `now` reaches the expiry.
    #[inline]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// Outcome of [`CredentialStore::delete_role_if_unused`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleDeletion {
    Deleted,
    NotFound,
    /// Nothing was changed; this many users still hold the role.
    InUse(i64),
}

/// Persistence for users, roles, permissions and reset tokens.
///
/// Errors follow the crate taxonomy: uniqueness violations are
/// [`ErrorKind::Conflict`] and unknown permission names are
/// [`ErrorKind::Invalid`]. Missing rows are reported through `Option`/`bool`
/// rather than errors.
///
/// [`ErrorKind::Conflict`]: crate::ErrorKind::Conflict
/// [`ErrorKind::Invalid`]: crate::ErrorKind::Invalid
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<UserRecord>>;

    /// Looks up by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Loads a user with their role and its permission names.
    ///
    /// The role is `None` when the user references a role that cannot be
    /// loaded.
    async fn find_user_with_role(
        &self,
        user_id: Uuid,
    ) -> Result<Option<(UserRecord, Option<RoleRecord>)>>;

    /// Creates a user holding the [`DEFAULT_ROLE`].
    async fn create_user(&self, new_user: NewUserRecord) -> Result<UserRecord>;

    /// Replaces the password hash. Returns `false` if the user is gone.
    async fn update_user_credential(&self, user_id: Uuid, password_hash: String) -> Result<bool>;

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<UserRecord>>;

    /// Moves a user to another role. Fails with `NotFound` if the role is missing.
    async fn assign_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<Option<UserRecord>>;

    async fn delete_user(&self, user_id: Uuid) -> Result<bool>;

    /// Lists users by creation time.
    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<UserRecord>>;

    async fn count_users_with_role(&self, role_id: Uuid) -> Result<i64>;

    /// Lists roles by name.
    async fn list_roles(&self) -> Result<Vec<RoleRecord>>;

    async fn find_role(&self, role_id: Uuid) -> Result<Option<RoleRecord>>;

    async fn find_role_by_name(&self, name: &str) -> Result<Option<RoleRecord>>;

    /// Creates a role holding exactly `permissions`, all of which must exist.
    async fn create_role(&self, name: &str, permissions: &[String]) -> Result<RoleRecord>;

    /// Renames and/or replaces the permission set in one step.
    async fn update_role(&self, role_id: Uuid, update: RoleUpdate) -> Result<Option<RoleRecord>>;

    /// Counts holders and deletes only if there are none, atomically.
    async fn delete_role_if_unused(&self, role_id: Uuid) -> Result<RoleDeletion>;

    /// Lists permissions by name.
    async fn list_permissions(&self) -> Result<Vec<PermissionRecord>>;

    async fn find_permission(&self, permission_id: Uuid) -> Result<Option<PermissionRecord>>;

    async fn create_permission(&self, name: &str) -> Result<PermissionRecord>;

    async fn update_permission(
        &self,
        permission_id: Uuid,
        name: &str,
    ) -> Result<Option<PermissionRecord>>;

    /// Deletes a permission and detaches it from every role.
    async fn delete_permission(&self, permission_id: Uuid) -> Result<bool>;

    async fn create_reset_token(&self, token: ResetTokenRecord) -> Result<()>;

    async fn find_reset_token(&self, token_digest: &str) -> Result<Option<ResetTokenRecord>>;

    /// Deletes a reset token. Only one caller ever gets `true` for a digest.
    async fn consume_reset_token(&self, token_digest: &str) -> Result<bool>;

    /// Deletes a reset token and sets its owner's password hash in one step.
    ///
    /// Returns the owner, or `None` if the token was already spent. On error
    /// neither the token nor the credential changes.
    async fn redeem_reset_token(
        &self,
        token_digest: &str,
        password_hash: String,
    ) -> Result<Option<Uuid>>;

    async fn delete_expired_reset_tokens(&self, now: Timestamp) -> Result<usize>;
}

/// Persistence for revoked session token ids.
#[async_trait::async_trait]
pub trait RevocationStore: Send + Sync {
    /// Records `token_id` as revoked until it would have expired anyway.
    async fn revoke_token(&self, token_id: Uuid, user_id: Uuid, expires_at: Timestamp)
    -> Result<()>;

    async fn is_token_revoked(&self, token_id: Uuid) -> Result<bool>;

    /// Drops revocations whose tokens have expired by `now`.
    async fn delete_expired_revocations(&self, now: Timestamp) -> Result<usize>;
}

/// Sorts and deduplicates permission names.
pub(crate) fn normalize_permission_names(names: &[String]) -> Vec<String> {
    let mut names = names.to_vec();
    names.sort_unstable();
    names.dedup();
    names
}

/// Rejects permission names that do not exist as rows.
pub(crate) fn unknown_permissions(unknown: &[String]) -> Error {
    Error::invalid(format!("Unknown permissions: {}", unknown.join(", ")))
}
