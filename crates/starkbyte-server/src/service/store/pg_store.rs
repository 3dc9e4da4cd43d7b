//! [`CredentialStore`] and [`RevocationStore`] over PostgreSQL.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use jiff::Timestamp;
use starkbyte_postgres::model::{
    NewPasswordResetToken, NewPermission, NewRevokedToken, NewRole, NewUser, PasswordResetToken,
    Permission, Role, UpdatePermission, UpdateRole, UpdateUser, User,
};
use starkbyte_postgres::query::{
    Pagination, PasswordResetTokenRepository, PermissionRepository, RevokedTokenRepository,
    RolePermissionRepository, RoleRepository, UserRepository,
};
use starkbyte_postgres::{PgClient, PgError};
use uuid::Uuid;

use super::{
    CredentialStore, DEFAULT_ROLE, NewUserRecord, PermissionRecord, ProfileUpdate,
    ResetTokenRecord, RevocationStore, RoleDeletion, RoleRecord, RoleUpdate, UserRecord,
    normalize_permission_names, unknown_permissions,
};
use crate::service::auth::UserProfile;
use crate::tracing_targets::TRACING_TARGET_STORE;
use crate::{Error, Result};

/// Result of a transaction that may stop early without writing anything.
enum Staged<T> {
    Done(T),
    NotFound,
    UnknownPermissions(Vec<String>),
}

impl<T> Staged<T> {
    fn into_result(self, resource: &'static str) -> Result<Option<T>> {
        match self {
            Self::Done(value) => Ok(Some(value)),
            Self::NotFound => {
                tracing::debug!(target: TRACING_TARGET_STORE, resource, "not found");
                Ok(None)
            }
            Self::UnknownPermissions(unknown) => Err(unknown_permissions(&unknown)),
        }
    }
}

fn timestamp(ts: jiff_diesel::Timestamp) -> Timestamp {
    Timestamp::from(ts)
}

fn user_record(user: User) -> UserRecord {
    UserRecord {
        id: user.id,
        email: user.email,
        password_hash: user.password_hash,
        profile: UserProfile {
            full_name: user.full_name,
            phone: user.phone,
            address_line: user.address_line,
            city: user.city,
            postal_code: user.postal_code,
            country: user.country,
        },
        role_id: user.role_id,
        created_at: timestamp(user.created_at),
        updated_at: timestamp(user.updated_at),
    }
}

fn role_record(role: Role, permissions: Vec<String>) -> RoleRecord {
    RoleRecord {
        id: role.id,
        name: role.name,
        permissions,
        created_at: timestamp(role.created_at),
        updated_at: timestamp(role.updated_at),
    }
}

fn permission_record(permission: Permission) -> PermissionRecord {
    PermissionRecord {
        id: permission.id,
        name: permission.name,
        created_at: timestamp(permission.created_at),
        updated_at: timestamp(permission.updated_at),
    }
}

fn reset_token_record(token: PasswordResetToken) -> ResetTokenRecord {
    ResetTokenRecord {
        token_digest: token.token_digest,
        user_id: token.user_id,
        created_at: timestamp(token.created_at),
        expires_at: timestamp(token.expires_at),
    }
}

/// Resolves names to permissions, or returns the names that do not exist.
fn partition_permissions(
    requested: &[String],
    found: Vec<Permission>,
) -> std::result::Result<Vec<Uuid>, Vec<String>> {
    let found_names: BTreeSet<&str> = found.iter().map(|p| p.name.as_str()).collect();
    let unknown: Vec<String> = requested
        .iter()
        .filter(|name| !found_names.contains(name.as_str()))
        .cloned()
        .collect();

    if unknown.is_empty() {
        Ok(found.into_iter().map(|p| p.id).collect())
    } else {
        Err(unknown)
    }
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    client: PgClient,
}

impl PgStore {
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    #[inline]
    pub fn client(&self) -> &PgClient {
        &self.client
    }
}

impl fmt::Debug for PgStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgStore")
            .field("client", &self.client)
            .finish()
    }
}

#[async_trait::async_trait]
impl CredentialStore for PgStore {
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<UserRecord>> {
        let mut conn = self.client.get_connection().await?;
        let user = conn.find_user_by_id(user_id).await?;
        Ok(user.map(user_record))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let mut conn = self.client.get_connection().await?;
        let user = conn.find_user_by_email(email).await?;
        Ok(user.map(user_record))
    }

    async fn find_user_with_role(
        &self,
        user_id: Uuid,
    ) -> Result<Option<(UserRecord, Option<RoleRecord>)>> {
        let mut conn = self.client.get_connection().await?;
        let Some((user, role)) = conn.find_user_with_role(user_id).await? else {
            return Ok(None);
        };

        let role = match role {
            Some(role) => {
                let permissions = conn.list_role_permission_names(role.id).await?;
                Some(role_record(role, permissions))
            }
            None => None,
        };

        Ok(Some((user_record(user), role)))
    }

    async fn create_user(&self, new_user: NewUserRecord) -> Result<UserRecord> {
        let mut conn = self.client.get_connection().await?;
        let Some(default_role) = conn.find_role_by_name(DEFAULT_ROLE).await? else {
            tracing::error!(
                target: TRACING_TARGET_STORE,
                role = DEFAULT_ROLE,
                "default role is missing"
            );
            return Err(Error::internal("store", "Default role is missing"));
        };

        let user = conn
            .create_user(NewUser {
                email: new_user.email,
                password_hash: new_user.password_hash,
                full_name: new_user.full_name,
                role_id: default_role.id,
            })
            .await?;

        Ok(user_record(user))
    }

    async fn update_user_credential(&self, user_id: Uuid, password_hash: String) -> Result<bool> {
        let mut conn = self.client.get_connection().await?;
        let updates = UpdateUser {
            password_hash: Some(password_hash),
            ..Default::default()
        };

        Ok(conn.update_user(user_id, updates).await?.is_some())
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<UserRecord>> {
        let mut conn = self.client.get_connection().await?;
        let updates = UpdateUser {
            full_name: update.full_name,
            phone: update.phone,
            address_line: update.address_line,
            city: update.city,
            postal_code: update.postal_code,
            country: update.country,
            ..Default::default()
        };

        let user = conn.update_user(user_id, updates).await?;
        Ok(user.map(user_record))
    }

    async fn assign_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<Option<UserRecord>> {
        let mut conn = self.client.get_connection().await?;

        // The role row lock orders this against a concurrent delete of the role.
        let staged = conn
            .transaction(|conn| {
                Box::pin(async move {
                    if conn.lock_role(role_id).await?.is_none() {
                        return Ok::<_, PgError>(None);
                    }

                    let updates = UpdateUser {
                        role_id: Some(role_id),
                        ..Default::default()
                    };
                    let user = conn.update_user(user_id, updates).await?;
                    Ok(Some(user))
                })
            })
            .await?;

        match staged {
            Some(user) => Ok(user.map(user_record)),
            None => Err(Error::not_found("Role not found")),
        }
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
        let mut conn = self.client.get_connection().await?;
        Ok(conn.delete_user(user_id).await?)
    }

    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<UserRecord>> {
        let mut conn = self.client.get_connection().await?;
        let users = conn.list_users(Pagination::new(limit, offset)).await?;
        Ok(users.into_iter().map(user_record).collect())
    }

    async fn count_users_with_role(&self, role_id: Uuid) -> Result<i64> {
        let mut conn = self.client.get_connection().await?;
        Ok(conn.count_users_with_role(role_id).await?)
    }

    async fn list_roles(&self) -> Result<Vec<RoleRecord>> {
        let mut conn = self.client.get_connection().await?;
        let roles = conn.list_roles().await?;

        let mut permissions: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (role_id, name) in conn.list_all_role_permission_names().await? {
            permissions.entry(role_id).or_default().push(name);
        }

        Ok(roles
            .into_iter()
            .map(|role| {
                let names = permissions.remove(&role.id).unwrap_or_default();
                role_record(role, names)
            })
            .collect())
    }

    async fn find_role(&self, role_id: Uuid) -> Result<Option<RoleRecord>> {
        let mut conn = self.client.get_connection().await?;
        let Some(role) = conn.find_role_by_id(role_id).await? else {
            return Ok(None);
        };

        let permissions = conn.list_role_permission_names(role.id).await?;
        Ok(Some(role_record(role, permissions)))
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<RoleRecord>> {
        let mut conn = self.client.get_connection().await?;
        let Some(role) = conn.find_role_by_name(name).await? else {
            return Ok(None);
        };

        let permissions = conn.list_role_permission_names(role.id).await?;
        Ok(Some(role_record(role, permissions)))
    }

    async fn create_role(&self, name: &str, permissions: &[String]) -> Result<RoleRecord> {
        let mut conn = self.client.get_connection().await?;
        let name = name.to_owned();
        let names = normalize_permission_names(permissions);

        let staged = conn
            .transaction(|conn| {
                Box::pin(async move {
                    let found = conn.find_permissions_by_names(&names).await?;
                    let permission_ids = match partition_permissions(&names, found) {
                        Ok(ids) => ids,
                        Err(unknown) => return Ok::<_, PgError>(Staged::UnknownPermissions(unknown)),
                    };

                    let role = conn.create_role(NewRole { name }).await?;
                    conn.replace_role_permissions(role.id, &permission_ids)
                        .await?;

                    Ok(Staged::Done(role_record(role, names)))
                })
            })
            .await?;

        staged
            .into_result("role")?
            .ok_or_else(|| Error::internal("store", "Role creation returned no role"))
    }

    async fn update_role(&self, role_id: Uuid, update: RoleUpdate) -> Result<Option<RoleRecord>> {
        let mut conn = self.client.get_connection().await?;
        let names = update
            .permissions
            .as_deref()
            .map(normalize_permission_names);
        let new_name = update.name;

        let staged = conn
            .transaction(|conn| {
                Box::pin(async move {
                    if conn.lock_role(role_id).await?.is_none() {
                        return Ok::<_, PgError>(Staged::NotFound);
                    }

                    let permission_ids = match &names {
                        Some(names) => {
                            let found = conn.find_permissions_by_names(names).await?;
                            match partition_permissions(names, found) {
                                Ok(ids) => Some(ids),
                                Err(unknown) => return Ok(Staged::UnknownPermissions(unknown)),
                            }
                        }
                        None => None,
                    };

                    let updated = match new_name {
                        Some(name) => {
                            let updates = UpdateRole {
                                name: Some(name),
                                ..Default::default()
                            };
                            conn.update_role(role_id, updates).await?
                        }
                        None => conn.touch_role(role_id).await?,
                    };
                    let Some(role) = updated else {
                        return Ok(Staged::NotFound);
                    };

                    if let Some(permission_ids) = permission_ids {
                        conn.replace_role_permissions(role_id, &permission_ids)
                            .await?;
                    }

                    let permissions = conn.list_role_permission_names(role_id).await?;
                    Ok(Staged::Done(role_record(role, permissions)))
                })
            })
            .await?;

        staged.into_result("role")
    }

    async fn delete_role_if_unused(&self, role_id: Uuid) -> Result<RoleDeletion> {
        let mut conn = self.client.get_connection().await?;

        let deletion = conn
            .transaction(|conn| {
                Box::pin(async move {
                    if conn.lock_role(role_id).await?.is_none() {
                        return Ok::<_, PgError>(RoleDeletion::NotFound);
                    }

                    let holders = conn.count_users_with_role(role_id).await?;
                    if holders > 0 {
                        return Ok(RoleDeletion::InUse(holders));
                    }

                    conn.delete_role(role_id).await?;
                    Ok(RoleDeletion::Deleted)
                })
            })
            .await?;

        Ok(deletion)
    }

    async fn list_permissions(&self) -> Result<Vec<PermissionRecord>> {
        let mut conn = self.client.get_connection().await?;
        let permissions = conn.list_permissions().await?;
        Ok(permissions.into_iter().map(permission_record).collect())
    }

    async fn find_permission(&self, permission_id: Uuid) -> Result<Option<PermissionRecord>> {
        let mut conn = self.client.get_connection().await?;
        let permission = conn.find_permission_by_id(permission_id).await?;
        Ok(permission.map(permission_record))
    }

    async fn create_permission(&self, name: &str) -> Result<PermissionRecord> {
        let mut conn = self.client.get_connection().await?;
        let new_permission = NewPermission {
            name: name.to_owned(),
        };

        let permission = conn.create_permission(new_permission).await?;
        Ok(permission_record(permission))
    }

    async fn update_permission(
        &self,
        permission_id: Uuid,
        name: &str,
    ) -> Result<Option<PermissionRecord>> {
        let mut conn = self.client.get_connection().await?;
        let updates = UpdatePermission {
            name: Some(name.to_owned()),
            ..Default::default()
        };

        let permission = conn.update_permission(permission_id, updates).await?;
        Ok(permission.map(permission_record))
    }

    async fn delete_permission(&self, permission_id: Uuid) -> Result<bool> {
        let mut conn = self.client.get_connection().await?;
        Ok(conn.delete_permission(permission_id).await?)
    }

    async fn create_reset_token(&self, token: ResetTokenRecord) -> Result<()> {
        let mut conn = self.client.get_connection().await?;
        let new_token = NewPasswordResetToken {
            token_digest: token.token_digest,
            user_id: token.user_id,
            created_at: jiff_diesel::Timestamp::from(token.created_at),
            expires_at: jiff_diesel::Timestamp::from(token.expires_at),
        };

        conn.create_reset_token(new_token).await?;
        Ok(())
    }

    async fn find_reset_token(&self, token_digest: &str) -> Result<Option<ResetTokenRecord>> {
        let mut conn = self.client.get_connection().await?;
        let token = conn.find_reset_token(token_digest).await?;
        Ok(token.map(reset_token_record))
    }

    async fn consume_reset_token(&self, token_digest: &str) -> Result<bool> {
        let mut conn = self.client.get_connection().await?;
        Ok(conn.consume_reset_token(token_digest).await?)
    }

    async fn redeem_reset_token(
        &self,
        token_digest: &str,
        password_hash: String,
    ) -> Result<Option<Uuid>> {
        let mut conn = self.client.get_connection().await?;
        let token_digest = token_digest.to_owned();

        let redeemed = conn
            .transaction(|conn| {
                Box::pin(async move {
                    let Some(token) = conn.find_reset_token(&token_digest).await? else {
                        return Ok::<_, PgError>(None);
                    };
                    if !conn.consume_reset_token(&token_digest).await? {
                        return Ok(None);
                    }

                    let updates = UpdateUser {
                        password_hash: Some(password_hash),
                        ..Default::default()
                    };
                    if conn.update_user(token.user_id, updates).await?.is_none() {
                        // Rolls back the delete above.
                        return Err(PgError::Unexpected("reset token outlived its user".into()));
                    }

                    Ok(Some(token.user_id))
                })
            })
            .await?;

        Ok(redeemed)
    }

    async fn delete_expired_reset_tokens(&self, now: Timestamp) -> Result<usize> {
        let mut conn = self.client.get_connection().await?;
        Ok(conn.delete_expired_reset_tokens(now).await?)
    }
}

#[async_trait::async_trait]
impl RevocationStore for PgStore {
    async fn revoke_token(
        &self,
        token_id: Uuid,
        user_id: Uuid,
        expires_at: Timestamp,
    ) -> Result<()> {
        let mut conn = self.client.get_connection().await?;
        let new_token = NewRevokedToken {
            token_id,
            user_id,
            expires_at: jiff_diesel::Timestamp::from(expires_at),
        };

        conn.revoke_token(new_token).await?;
        Ok(())
    }

    async fn is_token_revoked(&self, token_id: Uuid) -> Result<bool> {
        let mut conn = self.client.get_connection().await?;
        Ok(conn.is_token_revoked(token_id).await?)
    }

    async fn delete_expired_revocations(&self, now: Timestamp) -> Result<usize> {
        let mut conn = self.client.get_connection().await?;
        Ok(conn.delete_expired_revocations(now).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permission(name: &str) -> Permission {
        let now = jiff_diesel::Timestamp::from(Timestamp::now());
        Permission {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn partition_reports_unknown_names() {
        let requested = vec!["a".to_owned(), "b".to_owned(), "c".to_owned()];
        let found = vec![permission("a"), permission("c")];

        let unknown = partition_permissions(&requested, found).unwrap_err();
        assert_eq!(unknown, vec!["b".to_owned()]);
    }

    #[test]
    fn partition_resolves_every_name() {
        let requested = vec!["a".to_owned()];
        let found = vec![permission("a")];

        let ids = partition_permissions(&requested, found).unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn unknown_permissions_are_invalid() {
        let error = unknown_permissions(&["x".to_owned()]);
        assert_eq!(error.kind(), crate::ErrorKind::Invalid);
        assert!(error.message().contains('x'));
    }
}
