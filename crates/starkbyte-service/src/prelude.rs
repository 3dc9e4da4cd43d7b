//! Commonly used items from starkbyte-service.
//!
//! ```rust,ignore
//! use starkbyte_service::prelude::*;
//! ```

pub use crate::audit::{AuditAction, AuditEvent, AuditProvider, AuditService};
pub use crate::mail::{MailMessage, MailProvider, MailService};
pub use crate::{BoxedError, Error, ErrorKind, Result};
