//! Role, permission and user administration.
//!
//! Authorization is the caller's job: handlers run the guard before calling
//! in here. Every successful mutation records an audit event on a background
//! task; a failing audit sink never fails the mutation.

mod roles;
mod users;

pub use roles::RoleAdmin;
pub use users::UserAdmin;

use crate::{Error, Result};

/// Upper bound for role and permission names.
pub const MAX_NAME_LENGTH: usize = 64;

/// Trims `name` and rejects empty or overlong names.
pub(crate) fn validate_name(kind: &str, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid(format!("{kind} name cannot be empty")));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::invalid(format!(
            "{kind} name cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }

    Ok(name.to_owned())
}
