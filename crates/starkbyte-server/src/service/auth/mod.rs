//! Principals, permission sets and the authorization guard.
//!
//! Access is decided by the resolved permission set alone. A role's name
//! grants nothing; `*` in the set grants everything.

mod guard;
mod permission;
mod principal;

pub use guard::{require_ownership_or_permission, require_permission};
pub use permission::{Permission, PermissionSet, WILDCARD};
pub use principal::{Principal, UserProfile};
