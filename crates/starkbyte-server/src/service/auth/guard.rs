//! Allow/deny decisions over a resolved [`Principal`].
//!
//! A denial is always [`ErrorKind::Forbidden`], never `Unauthenticated`:
//! by the time a guard runs, the caller is known.
//!
//! [`ErrorKind::Forbidden`]: crate::ErrorKind::Forbidden

use uuid::Uuid;

use super::Principal;
use crate::tracing_targets::TRACING_TARGET_AUTHORIZATION;
use crate::{Error, Result};

/// Allows iff the principal holds `*` or exactly `name`.
pub fn require_permission(principal: &Principal, name: impl AsRef<str>) -> Result<()> {
    let name = name.as_ref();
    if principal.can(name) {
        return Ok(());
    }

    tracing::warn!(
        target: TRACING_TARGET_AUTHORIZATION,
        user_id = %principal.user_id,
        role = %principal.role_name,
        permission = name,
        "permission denied"
    );

    Err(Error::forbidden(format!("Missing permission '{name}'")))
}

/// Allows iff the principal is `owner_id` or holds `*` or exactly `name`.
pub fn require_ownership_or_permission(
    principal: &Principal,
    owner_id: Uuid,
    name: impl AsRef<str>,
) -> Result<()> {
    if principal.is_user(owner_id) {
        return Ok(());
    }

    require_permission(principal, name)
}
