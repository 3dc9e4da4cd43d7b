//! Permission repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{NewPermission, Permission, UpdatePermission};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for permission database operations.
pub trait PermissionRepository {
    /// Inserts a new permission. Fails with `permissions_name_key` if taken.
    fn create_permission(
        &mut self,
        new_permission: NewPermission,
    ) -> impl Future<Output = PgResult<Permission>> + Send;

    /// Finds a permission by id.
    fn find_permission_by_id(
        &mut self,
        permission_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Permission>>> + Send;

    /// Loads every permission whose name is in `names`.
    ///
    /// Names with no matching row are silently absent from the result.
    fn find_permissions_by_names(
        &mut self,
        names: &[String],
    ) -> impl Future<Output = PgResult<Vec<Permission>>> + Send;

    /// Renames a permission. Returns `None` if it does not exist.
    fn update_permission(
        &mut self,
        permission_id: Uuid,
        updates: UpdatePermission,
    ) -> impl Future<Output = PgResult<Option<Permission>>> + Send;

    /// Deletes a permission. Links in `role_permissions` cascade.
    fn delete_permission(
        &mut self,
        permission_id: Uuid,
    ) -> impl Future<Output = PgResult<bool>> + Send;

    /// Lists every permission ordered by name.
    fn list_permissions(&mut self) -> impl Future<Output = PgResult<Vec<Permission>>> + Send;
}

impl PermissionRepository for PgConnection {
    async fn create_permission(&mut self, new_permission: NewPermission) -> PgResult<Permission> {
        use schema::permissions;

        diesel::insert_into(permissions::table)
            .values(&new_permission)
            .returning(Permission::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_permission_by_id(&mut self, permission_id: Uuid) -> PgResult<Option<Permission>> {
        use schema::permissions;

        permissions::table
            .find(permission_id)
            .select(Permission::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn find_permissions_by_names(&mut self, names: &[String]) -> PgResult<Vec<Permission>> {
        use schema::permissions::{self, dsl};

        if names.is_empty() {
            return Ok(Vec::new());
        }

        permissions::table
            .filter(dsl::name.eq_any(names))
            .select(Permission::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn update_permission(
        &mut self,
        permission_id: Uuid,
        mut updates: UpdatePermission,
    ) -> PgResult<Option<Permission>> {
        use schema::permissions;

        updates.updated_at = Some(jiff_diesel::Timestamp::from(Timestamp::now()));
        diesel::update(permissions::table.find(permission_id))
            .set(&updates)
            .returning(Permission::as_returning())
            .get_result(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn delete_permission(&mut self, permission_id: Uuid) -> PgResult<bool> {
        use schema::permissions;

        let deleted = diesel::delete(permissions::table.find(permission_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }

    async fn list_permissions(&mut self) -> PgResult<Vec<Permission>> {
        use schema::permissions::{self, dsl};

        permissions::table
            .order(dsl::name.asc())
            .select(Permission::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }
}
