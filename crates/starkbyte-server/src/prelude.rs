//! Prelude module for starkbyte-server.
//!
//! ```rust
//! use starkbyte_server::prelude::*;
//! ```

pub use crate::extract::{AuthState, Json, Path, Query, SessionCookie, ValidateJson};
pub use crate::middleware::{RouterExt, require_authentication};
pub use crate::service::auth::{Permission, PermissionSet, Principal};
pub use crate::service::{
    AccountService, HealthCache, PasswordHasher, RoleAdmin, ServiceConfig, ServiceState,
    Session, SessionCarrier, SessionCodec, SessionConfig, SessionResolver, UserAdmin,
};
pub use crate::{Error, ErrorKind, Result};
