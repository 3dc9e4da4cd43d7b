//! Role model.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::roles;

/// A named role. Its permissions live in `role_permissions`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Role {
    /// Unique role identifier.
    pub id: Uuid,
    /// Case-sensitive unique role name.
    pub name: String,
    /// Timestamp when the role was created.
    pub created_at: Timestamp,
    /// Timestamp when the role was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new role.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRole {
    /// Unique role name.
    pub name: String,
}

/// Data for renaming a role.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateRole {
    pub name: Option<String>,
    pub updated_at: Option<Timestamp>,
}
