use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::role_permissions;

/// Link between a role and one of its permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = role_permissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RolePermission {
    pub role_id: Uuid,
    pub permission_id: Uuid,
}
