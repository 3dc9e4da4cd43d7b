//! Per-request session resolution.
//!
//! [`SessionResolver::resolve`] turns the token presented on a request into
//! either an authenticated [`Session`] or a [`SessionRejection`]. Nothing is
//! cached between requests: every call re-reads the user, role and permission
//! names from the store.

mod rejection;
mod resolver;

pub use rejection::SessionRejection;
pub use resolver::{Resolution, Session, SessionResolver};
