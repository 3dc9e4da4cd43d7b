//! Role/permission link repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::RolePermission;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for the links between roles and permissions.
pub trait RolePermissionRepository {
    /// Returns the permission names granted by one role.
    fn list_role_permission_names(
        &mut self,
        role_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<String>>> + Send;

    /// Returns `(role_id, permission_name)` for every link, for bulk listing.
    fn list_all_role_permission_names(
        &mut self,
    ) -> impl Future<Output = PgResult<Vec<(Uuid, String)>>> + Send;

    /// Replaces the whole permission set of a role.
    ///
    /// Not atomic on its own: call it inside a transaction.
    fn replace_role_permissions(
        &mut self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> impl Future<Output = PgResult<()>> + Send;
}

impl RolePermissionRepository for PgConnection {
    async fn list_role_permission_names(&mut self, role_id: Uuid) -> PgResult<Vec<String>> {
        use schema::{permissions, role_permissions};

        role_permissions::table
            .inner_join(permissions::table)
            .filter(role_permissions::role_id.eq(role_id))
            .order(permissions::name.asc())
            .select(permissions::name)
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn list_all_role_permission_names(&mut self) -> PgResult<Vec<(Uuid, String)>> {
        use schema::{permissions, role_permissions};

        role_permissions::table
            .inner_join(permissions::table)
            .order((role_permissions::role_id.asc(), permissions::name.asc()))
            .select((role_permissions::role_id, permissions::name))
            .load(self)
            .await
            .map_err(PgError::from)
    }

    async fn replace_role_permissions(
        &mut self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> PgResult<()> {
        use schema::role_permissions::{self, dsl};

        diesel::delete(role_permissions::table.filter(dsl::role_id.eq(role_id)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        if permission_ids.is_empty() {
            return Ok(());
        }

        let links: Vec<RolePermission> = permission_ids
            .iter()
            .map(|&permission_id| RolePermission {
                role_id,
                permission_id,
            })
            .collect();

        diesel::insert_into(role_permissions::table)
            .values(&links)
            .on_conflict_do_nothing()
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }
}
