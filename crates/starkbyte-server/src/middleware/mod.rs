//! Middleware for `axum::Router` and HTTP request processing.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use axum::Router;
//! use starkbyte_server::middleware::RouterExt;
//!
//! let app: Router = Router::new()
//!     .with_error_handling_layer(Duration::from_secs(30))
//!     .with_observability_layer();
//! ```

mod auth;
mod error_handling;
mod extensions;
mod observability;

pub use auth::require_authentication;
pub use extensions::RouterExt;
