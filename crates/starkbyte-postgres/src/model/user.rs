//! User account model.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::users;

/// A user row. Every user references exactly one role.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Normalized (trimmed, lowercased) email address.
    pub email: String,
    /// Encoded memory-hard password hash.
    pub password_hash: String,
    /// Display name.
    pub full_name: String,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Optional street address.
    pub address_line: Option<String>,
    /// Optional city.
    pub city: Option<String>,
    /// Optional postal code.
    pub postal_code: Option<String>,
    /// Optional country.
    pub country: Option<String>,
    /// Role granting this user's permissions.
    pub role_id: Uuid,
    /// Timestamp when the user was created.
    pub created_at: Timestamp,
    /// Timestamp when the user was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new user.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    /// Normalized email address.
    pub email: String,
    /// Encoded password hash.
    pub password_hash: String,
    /// Display name.
    pub full_name: String,
    /// Role to assign.
    pub role_id: Uuid,
}

/// Partial update of a user; `None` fields are left untouched.
///
/// The nested options on profile fields distinguish "clear" (`Some(None)`)
/// from "skip" (`None`).
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateUser {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<Option<String>>,
    pub address_line: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub postal_code: Option<Option<String>>,
    pub country: Option<Option<String>>,
    pub role_id: Option<Uuid>,
    pub updated_at: Option<Timestamp>,
}
