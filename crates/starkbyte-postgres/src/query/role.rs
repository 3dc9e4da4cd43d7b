//! Role repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{NewRole, Role, UpdateRole};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for role database operations.
///
/// Permission links are managed through [`RolePermissionRepository`].
///
/// [`RolePermissionRepository`]: crate::query::RolePermissionRepository
pub trait RoleRepository {
    /// Inserts a new role. Fails with `roles_name_key` if the name is taken.
    fn create_role(&mut self, new_role: NewRole) -> impl Future<Output = PgResult<Role>> + Send;

    /// Finds a role by id.
    fn find_role_by_id(
        &mut self,
        role_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Role>>> + Send;

    /// Finds a role by its exact, case-sensitive name.
    fn find_role_by_name(
        &mut self,
        name: &str,
    ) -> impl Future<Output = PgResult<Option<Role>>> + Send;

    /// Finds a role and takes a row lock on it until the transaction ends.
    ///
    /// Used to serialize concurrent updates and deletes of the same role.
    fn lock_role(&mut self, role_id: Uuid) -> impl Future<Output = PgResult<Option<Role>>> + Send;

    /// Renames a role. Returns `None` if it does not exist.
    fn update_role(
        &mut self,
        role_id: Uuid,
        updates: UpdateRole,
    ) -> impl Future<Output = PgResult<Option<Role>>> + Send;

    /// Touches `updated_at`, e.g. after the permission set changed.
    fn touch_role(&mut self, role_id: Uuid) -> impl Future<Output = PgResult<Option<Role>>> + Send;

    /// Deletes a role, returning whether a row was removed.
    ///
    /// Fails with `users_role_id_fkey` while users still reference the role.
    fn delete_role(&mut self, role_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;

    /// Lists every role ordered by name.
    fn list_roles(&mut self) -> impl Future<Output = PgResult<Vec<Role>>> + Send;
}

impl RoleRepository for PgConnection {
    async fn create_role(&mut self, new_role: NewRole) -> PgResult<Role> {
        use schema::roles;

        diesel::insert_into(roles::table)
            .values(&new_role)
            .returning(Role::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_role_by_id(&mut self, role_id: Uuid) -> PgResult<Option<Role>> {
        use schema::roles;

        roles::table
            .find(role_id)
            .select(Role::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn find_role_by_name(&mut self, name: &str) -> PgResult<Option<Role>> {
        use schema::roles::{self, dsl};

        roles::table
            .filter(dsl::name.eq(name))
            .select(Role::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn lock_role(&mut self, role_id: Uuid) -> PgResult<Option<Role>> {
        use schema::roles;

        roles::table
            .find(role_id)
            .select(Role::as_select())
            .for_update()
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn update_role(&mut self, role_id: Uuid, mut updates: UpdateRole) -> PgResult<Option<Role>> {
        use schema::roles;

        updates.updated_at = Some(jiff_diesel::Timestamp::from(Timestamp::now()));
        diesel::update(roles::table.find(role_id))
            .set(&updates)
            .returning(Role::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn touch_role(&mut self, role_id: Uuid) -> PgResult<Option<Role>> {
        self.update_role(role_id, UpdateRole::default()).await
    }

    async fn delete_role(&mut self, role_id: Uuid) -> PgResult<bool> {
        use schema::roles;

        let deleted = diesel::delete(roles::table.find(role_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }

    async fn list_roles(&mut self) -> PgResult<Vec<Role>> {
        use schema::roles::{self, dsl};

        roles::table
            .order(dsl::name.asc())
            .select(Role::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }
}
