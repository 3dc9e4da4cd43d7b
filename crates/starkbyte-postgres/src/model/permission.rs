use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::permissions;

/// A named permission, such as `view_users` or the wildcard `*`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = permissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Data for creating a new permission.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = permissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPermission {
    pub name: String,
}

/// Data for renaming a permission.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = permissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdatePermission {
    pub name: Option<String>,
    pub updated_at: Option<Timestamp>,
}
