//! Revoked session token model.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::revoked_tokens;

/// A session token that was revoked before its natural expiry.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = revoked_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RevokedToken {
    /// Token identifier (`jti` claim).
    pub token_id: Uuid,
    /// User the token was issued to.
    pub user_id: Uuid,
    /// Timestamp when the token was revoked.
    pub revoked_at: Timestamp,
    /// Natural expiry of the token; the row is useless afterwards.
    pub expires_at: Timestamp,
}

/// Data for revoking a session token.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = revoked_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRevokedToken {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub expires_at: Timestamp,
}

impl RevokedToken {
    /// Returns whether the underlying token has expired anyway.
    pub fn is_expired(&self) -> bool {
        jiff::Timestamp::now() >= jiff::Timestamp::from(self.expires_at)
    }
}
