//! Password reset token model.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::password_reset_tokens;

/// A pending password reset. Only the SHA-256 digest of the token is stored.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = password_reset_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PasswordResetToken {
    /// Hex-encoded digest of the emailed token.
    pub token_digest: String,
    /// User whose password the token resets.
    pub user_id: Uuid,
    /// Timestamp when the token was created.
    pub created_at: Timestamp,
    /// Timestamp after which the token is rejected.
    pub expires_at: Timestamp,
}

/// Data for storing a new reset token.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = password_reset_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPasswordResetToken {
    pub token_digest: String,
    pub user_id: Uuid,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl PasswordResetToken {
    /// Returns whether the token has expired.
    pub fn is_expired(&self) -> bool {
        jiff::Timestamp::now() >= jiff::Timestamp::from(self.expires_at)
    }
}
