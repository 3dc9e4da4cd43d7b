//! Request extractors.
//!
//! - [`AuthState`] resolves the session token to a principal
//! - [`Json`], [`ValidateJson`], [`Path`] and [`Query`] reject with the
//!   crate's JSON error body

pub mod auth;
pub mod reject;

pub use crate::extract::auth::{AuthState, SessionCookie};
pub use crate::extract::reject::{Json, Path, Query, ValidateJson};
