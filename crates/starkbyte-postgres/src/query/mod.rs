//! Repository traits implemented on [`PgConnection`].
//!
//! Every method takes `&mut self`, so the same calls work on a pooled
//! [`PgConn`] and on the connection handed to [`PgConn::transaction`].
//!
//! [`PgConnection`]: crate::PgConnection
//! [`PgConn`]: crate::PgConn
//! [`PgConn::transaction`]: crate::PgConn::transaction

mod audit_event;
mod password_reset_token;
mod permission;
mod revoked_token;
mod role;
mod role_permission;
mod user;

pub use audit_event::AuditEventRepository;
pub use password_reset_token::PasswordResetTokenRepository;
pub use permission::PermissionRepository;
pub use revoked_token::RevokedTokenRepository;
pub use role::RoleRepository;
pub use role_permission::RolePermissionRepository;
use serde::{Deserialize, Serialize};
pub use user::UserRepository;

/// Offset pagination for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of records to return.
    pub limit: i64,
    /// Number of records to skip.
    pub offset: i64,
}

impl Pagination {
    /// Upper bound applied to `limit`.
    pub const MAX_LIMIT: i64 = 200;

    /// Creates a pagination window, clamping both values into range.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset: offset.max(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(50, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        assert_eq!(Pagination::new(0, -5), Pagination { limit: 1, offset: 0 });
        assert_eq!(Pagination::new(10_000, 3).limit, Pagination::MAX_LIMIT);
    }
}
