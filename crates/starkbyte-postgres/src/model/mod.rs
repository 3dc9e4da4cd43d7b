//! Diesel models, one module per table.

mod audit_event;
mod password_reset_token;
mod permission;
mod revoked_token;
mod role;
mod role_permission;
mod user;

pub use audit_event::{AuditEvent, NewAuditEvent};
pub use password_reset_token::{NewPasswordResetToken, PasswordResetToken};
pub use permission::{NewPermission, Permission, UpdatePermission};
pub use revoked_token::{NewRevokedToken, RevokedToken};
pub use role::{NewRole, Role, UpdateRole};
pub use role_permission::RolePermission;
pub use user::{NewUser, UpdateUser, User};
