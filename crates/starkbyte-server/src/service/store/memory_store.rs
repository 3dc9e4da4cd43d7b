//! In-memory store for tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use jiff::Timestamp;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    CredentialStore, DEFAULT_ROLE, NewUserRecord, PermissionRecord, ProfileUpdate,
    ResetTokenRecord, RevocationStore, RoleDeletion, RoleRecord, RoleUpdate, UserRecord,
    normalize_permission_names, unknown_permissions,
};
use crate::service::auth::UserProfile;
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct StoredRole {
    id: Uuid,
    name: String,
    permission_ids: BTreeSet<Uuid>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

#[derive(Debug, Clone)]
struct StoredRevocation {
    expires_at: Timestamp,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, UserRecord>,
    roles: HashMap<Uuid, StoredRole>,
    permissions: HashMap<Uuid, PermissionRecord>,
    reset_tokens: HashMap<String, ResetTokenRecord>,
    revocations: HashMap<Uuid, StoredRevocation>,
    credential_writes_fail: bool,
}

impl MemoryState {
    fn check_credential_write(&self) -> Result<()> {
        if self.credential_writes_fail {
            return Err(Error::internal("store", "Credential write failed"));
        }
        Ok(())
    }

    fn role_record(&self, role: &StoredRole) -> RoleRecord {
        let mut permissions: Vec<String> = role
            .permission_ids
            .iter()
            .filter_map(|id| self.permissions.get(id))
            .map(|p| p.name.clone())
            .collect();
        permissions.sort_unstable();

        RoleRecord {
            id: role.id,
            name: role.name.clone(),
            permissions,
            created_at: role.created_at,
            updated_at: role.updated_at,
        }
    }

    fn role_name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        self.roles
            .values()
            .any(|r| r.name == name && Some(r.id) != except)
    }

    fn permission_name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        self.permissions
            .values()
            .any(|p| p.name == name && Some(p.id) != except)
    }

    fn resolve_permissions(&self, names: &[String]) -> Result<BTreeSet<Uuid>> {
        let mut ids = BTreeSet::new();
        let mut unknown = Vec::new();

        for name in names {
            match self.permissions.values().find(|p| &p.name == name) {
                Some(permission) => {
                    ids.insert(permission.id);
                }
                None => unknown.push(name.clone()),
            }
        }

        if unknown.is_empty() {
            Ok(ids)
        } else {
            Err(unknown_permissions(&unknown))
        }
    }

    fn insert_role(&mut self, name: &str) -> Uuid {
        let now = Timestamp::now();
        let role = StoredRole {
            id: Uuid::now_v7(),
            name: name.to_owned(),
            permission_ids: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        };

        let id = role.id;
        self.roles.insert(id, role);
        id
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn role_name_conflict() -> Error {
    Error::conflict("A role with this name already exists")
}

fn permission_name_conflict() -> Error {
    Error::conflict("A permission with this name already exists")
}

/// [`CredentialStore`] and [`RevocationStore`] kept in process memory.
///
/// Seeded with the [`DEFAULT_ROLE`]. Every operation runs under a single
/// lock, so compound operations are atomic. Clones share state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut state = MemoryState::default();
        state.insert_role(DEFAULT_ROLE);

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Points a user at a role id that does not exist.
    ///
    /// The relational store cannot get into this state; tests use it to
    /// exercise principals whose role cannot be loaded.
    pub async fn break_role_reference(&self, user_id: Uuid) -> bool {
        let mut state = self.state.lock().await;
        match state.users.get_mut(&user_id) {
            Some(user) => {
                user.role_id = Uuid::now_v7();
                true
            }
            None => false,
        }
    }

    /// Makes every password hash write fail until switched back.
    pub async fn fail_credential_writes(&self, fail: bool) {
        self.state.lock().await.credential_writes_fail = fail;
    }

    /// Number of stored reset tokens, expired or not.
    pub async fn reset_token_count(&self) -> usize {
        self.state.lock().await.reset_tokens.len()
    }

    /// Number of stored revocations, expired or not.
    pub async fn revocation_count(&self) -> usize {
        self.state.lock().await.revocations.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<UserRecord>> {
        Ok(self.state.lock().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let email = normalize_email(email);
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_with_role(
        &self,
        user_id: Uuid,
    ) -> Result<Option<(UserRecord, Option<RoleRecord>)>> {
        let state = self.state.lock().await;
        let Some(user) = state.users.get(&user_id) else {
            return Ok(None);
        };

        let role = state.roles.get(&user.role_id).map(|r| state.role_record(r));
        Ok(Some((user.clone(), role)))
    }

    async fn create_user(&self, new_user: NewUserRecord) -> Result<UserRecord> {
        let mut state = self.state.lock().await;
        let email = normalize_email(&new_user.email);
        if state.users.values().any(|u| u.email == email) {
            return Err(Error::conflict("A user with this email already exists"));
        }

        let Some(role_id) = state
            .roles
            .values()
            .find(|r| r.name == DEFAULT_ROLE)
            .map(|r| r.id)
        else {
            return Err(Error::internal("store", "Default role is missing"));
        };

        let now = Timestamp::now();
        let user = UserRecord {
            id: Uuid::now_v7(),
            email,
            password_hash: new_user.password_hash,
            profile: UserProfile {
                full_name: new_user.full_name,
                ..Default::default()
            },
            role_id,
            created_at: now,
            updated_at: now,
        };

        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user_credential(&self, user_id: Uuid, password_hash: String) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.check_credential_write()?;
        match state.users.get_mut(&user_id) {
            Some(user) => {
                user.password_hash = password_hash;
                user.updated_at = Timestamp::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<UserRecord>> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(None);
        };

        update.apply(&mut user.profile);
        user.updated_at = Timestamp::now();
        Ok(Some(user.clone()))
    }

    async fn assign_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<Option<UserRecord>> {
        let mut state = self.state.lock().await;
        if !state.roles.contains_key(&role_id) {
            return Err(Error::not_found("Role not found"));
        }

        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(None);
        };

        user.role_id = role_id;
        user.updated_at = Timestamp::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().await;
        let removed = state.users.remove(&user_id).is_some();
        if removed {
            state.reset_tokens.retain(|_, t| t.user_id != user_id);
        }
        Ok(removed)
    }

    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<UserRecord>> {
        let state = self.state.lock().await;
        let mut users: Vec<UserRecord> = state.users.values().cloned().collect();
        users.sort_by_key(|u| (u.created_at, u.id));

        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit.max(1)).unwrap_or(usize::MAX);
        Ok(users.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_users_with_role(&self, role_id: Uuid) -> Result<i64> {
        let state = self.state.lock().await;
        let count = state.users.values().filter(|u| u.role_id == role_id).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn list_roles(&self) -> Result<Vec<RoleRecord>> {
        let state = self.state.lock().await;
        let mut roles: Vec<RoleRecord> = state
            .roles
            .values()
            .map(|r| state.role_record(r))
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn find_role(&self, role_id: Uuid) -> Result<Option<RoleRecord>> {
        let state = self.state.lock().await;
        Ok(state.roles.get(&role_id).map(|r| state.role_record(r)))
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<RoleRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .roles
            .values()
            .find(|r| r.name == name)
            .map(|r| state.role_record(r)))
    }

    async fn create_role(&self, name: &str, permissions: &[String]) -> Result<RoleRecord> {
        let mut state = self.state.lock().await;
        if state.role_name_taken(name, None) {
            return Err(role_name_conflict());
        }

        let names = normalize_permission_names(permissions);
        let permission_ids = state.resolve_permissions(&names)?;

        let role_id = state.insert_role(name);
        let Some(role) = state.roles.get_mut(&role_id) else {
            return Err(Error::internal("store", "Role vanished during creation"));
        };
        role.permission_ids = permission_ids;

        let role = role.clone();
        Ok(state.role_record(&role))
    }

    async fn update_role(&self, role_id: Uuid, update: RoleUpdate) -> Result<Option<RoleRecord>> {
        let mut state = self.state.lock().await;
        if !state.roles.contains_key(&role_id) {
            return Ok(None);
        }

        if let Some(name) = &update.name
            && state.role_name_taken(name, Some(role_id))
        {
            return Err(role_name_conflict());
        }

        let permission_ids = match &update.permissions {
            Some(names) => Some(state.resolve_permissions(&normalize_permission_names(names))?),
            None => None,
        };

        let Some(role) = state.roles.get_mut(&role_id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            role.name = name;
        }
        if let Some(permission_ids) = permission_ids {
            role.permission_ids = permission_ids;
        }
        role.updated_at = Timestamp::now();

        let role = role.clone();
        Ok(Some(state.role_record(&role)))
    }

    async fn delete_role_if_unused(&self, role_id: Uuid) -> Result<RoleDeletion> {
        let mut state = self.state.lock().await;
        if !state.roles.contains_key(&role_id) {
            return Ok(RoleDeletion::NotFound);
        }

        let holders = state.users.values().filter(|u| u.role_id == role_id).count();
        if holders > 0 {
            return Ok(RoleDeletion::InUse(
                i64::try_from(holders).unwrap_or(i64::MAX),
            ));
        }

        state.roles.remove(&role_id);
        Ok(RoleDeletion::Deleted)
    }

    async fn list_permissions(&self) -> Result<Vec<PermissionRecord>> {
        let state = self.state.lock().await;
        let mut permissions: Vec<PermissionRecord> = state.permissions.values().cloned().collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(permissions)
    }

    async fn find_permission(&self, permission_id: Uuid) -> Result<Option<PermissionRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .permissions
            .get(&permission_id)
            .cloned())
    }

    async fn create_permission(&self, name: &str) -> Result<PermissionRecord> {
        let mut state = self.state.lock().await;
        if state.permission_name_taken(name, None) {
            return Err(permission_name_conflict());
        }

        let now = Timestamp::now();
        let permission = PermissionRecord {
            id: Uuid::now_v7(),
            name: name.to_owned(),
            created_at: now,
            updated_at: now,
        };

        state.permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    async fn update_permission(
        &self,
        permission_id: Uuid,
        name: &str,
    ) -> Result<Option<PermissionRecord>> {
        let mut state = self.state.lock().await;
        if !state.permissions.contains_key(&permission_id) {
            return Ok(None);
        }
        if state.permission_name_taken(name, Some(permission_id)) {
            return Err(permission_name_conflict());
        }

        let Some(permission) = state.permissions.get_mut(&permission_id) else {
            return Ok(None);
        };
        permission.name = name.to_owned();
        permission.updated_at = Timestamp::now();
        Ok(Some(permission.clone()))
    }

    async fn delete_permission(&self, permission_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.permissions.remove(&permission_id).is_none() {
            return Ok(false);
        }

        for role in state.roles.values_mut() {
            role.permission_ids.remove(&permission_id);
        }
        Ok(true)
    }

    async fn create_reset_token(&self, token: ResetTokenRecord) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&token.user_id) {
            return Err(Error::invalid("Referenced user does not exist"));
        }
        if token.expires_at <= token.created_at {
            return Err(Error::invalid("Reset token must expire after creation"));
        }

        state.reset_tokens.insert(token.token_digest.clone(), token);
        Ok(())
    }

    async fn find_reset_token(&self, token_digest: &str) -> Result<Option<ResetTokenRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .reset_tokens
            .get(token_digest)
            .cloned())
    }

    async fn consume_reset_token(&self, token_digest: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        Ok(state.reset_tokens.remove(token_digest).is_some())
    }

    async fn redeem_reset_token(
        &self,
        token_digest: &str,
        password_hash: String,
    ) -> Result<Option<Uuid>> {
        let mut state = self.state.lock().await;
        let Some(user_id) = state.reset_tokens.get(token_digest).map(|t| t.user_id) else {
            return Ok(None);
        };
        state.check_credential_write()?;

        let Some(user) = state.users.get_mut(&user_id) else {
            return Err(Error::internal("store", "Reset token outlived its user"));
        };
        user.password_hash = password_hash;
        user.updated_at = Timestamp::now();
        state.reset_tokens.remove(token_digest);

        Ok(Some(user_id))
    }

    async fn delete_expired_reset_tokens(&self, now: Timestamp) -> Result<usize> {
        let mut state = self.state.lock().await;
        let before = state.reset_tokens.len();
        state.reset_tokens.retain(|_, t| !t.is_expired_at(now));
        Ok(before - state.reset_tokens.len())
    }
}

#[async_trait::async_trait]
impl RevocationStore for MemoryStore {
    async fn revoke_token(
        &self,
        token_id: Uuid,
        _user_id: Uuid,
        expires_at: Timestamp,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .revocations
            .entry(token_id)
            .or_insert(StoredRevocation { expires_at });
        Ok(())
    }

    async fn is_token_revoked(&self, token_id: Uuid) -> Result<bool> {
        Ok(self.state.lock().await.revocations.contains_key(&token_id))
    }

    async fn delete_expired_revocations(&self, now: Timestamp) -> Result<usize> {
        let mut state = self.state.lock().await;
        let before = state.revocations.len();
        state.revocations.retain(|_, r| now < r.expires_at);
        Ok(before - state.revocations.len())
    }
}
