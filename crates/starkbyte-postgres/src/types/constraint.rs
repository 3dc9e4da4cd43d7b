//! Named constraint violations raised by the authorization schema.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A constraint from the migrations, recognised by its PostgreSQL name.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum ConstraintViolation {
    #[strum(serialize = "users_email_key")]
    UserEmailTaken,
    #[strum(serialize = "users_email_not_empty")]
    UserEmailNotEmpty,
    #[strum(serialize = "users_role_id_fkey")]
    UserRoleReference,

    #[strum(serialize = "roles_name_key")]
    RoleNameTaken,
    #[strum(serialize = "roles_name_not_empty")]
    RoleNameNotEmpty,

    #[strum(serialize = "permissions_name_key")]
    PermissionNameTaken,
    #[strum(serialize = "permissions_name_not_empty")]
    PermissionNameNotEmpty,

    #[strum(serialize = "role_permissions_pkey")]
    RolePermissionDuplicate,

    #[strum(serialize = "password_reset_tokens_expires_after_created")]
    ResetTokenExpiresAfterCreated,
}

/// Broad classes of constraint violations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintCategory {
    /// Format and emptiness checks.
    Validation,
    /// Timestamp ordering checks.
    Chronological,
    /// Foreign keys that still have dependants.
    Reference,
    /// Unique keys and primary keys.
    Uniqueness,
}

impl ConstraintViolation {
    /// Parses a constraint name, returning `None` for names outside this schema.
    ///
    /// ```
    /// use starkbyte_postgres::types::ConstraintViolation;
    ///
    /// let violation = ConstraintViolation::new("roles_name_key");
    /// assert_eq!(violation, Some(ConstraintViolation::RoleNameTaken));
    /// assert!(ConstraintViolation::new("unknown_constraint").is_none());
    /// ```
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the table the constraint belongs to.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::UserEmailTaken | Self::UserEmailNotEmpty | Self::UserRoleReference => "users",
            Self::RoleNameTaken | Self::RoleNameNotEmpty => "roles",
            Self::PermissionNameTaken | Self::PermissionNameNotEmpty => "permissions",
            Self::RolePermissionDuplicate => "role_permissions",
            Self::ResetTokenExpiresAfterCreated => "password_reset_tokens",
        }
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            Self::UserEmailNotEmpty | Self::RoleNameNotEmpty | Self::PermissionNameNotEmpty => {
                ConstraintCategory::Validation
            }
            Self::ResetTokenExpiresAfterCreated => ConstraintCategory::Chronological,
            Self::UserRoleReference => ConstraintCategory::Reference,
            Self::UserEmailTaken
            | Self::RoleNameTaken
            | Self::PermissionNameTaken
            | Self::RolePermissionDuplicate => ConstraintCategory::Uniqueness,
        }
    }
}

impl From<ConstraintViolation> for String {
    #[inline]
    fn from(val: ConstraintViolation) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for ConstraintViolation {
    type Error = strum::ParseError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
