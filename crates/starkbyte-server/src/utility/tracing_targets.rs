//! Tracing targets used across the server.
//!
//! Filter with e.g. `RUST_LOG=starkbyte_server::session=debug`.

/// Password hashing.
pub const TRACING_TARGET_HASHER: &str = "starkbyte_server::hasher";

/// Session token issuing and verification.
pub const TRACING_TARGET_SESSION: &str = "starkbyte_server::session";

/// Authorization guard decisions.
pub const TRACING_TARGET_AUTHORIZATION: &str = "starkbyte_server::authorization";

/// Registration, login, logout and password flows.
pub const TRACING_TARGET_AUTHENTICATION: &str = "starkbyte_server::authentication";

/// Role and permission administration.
pub const TRACING_TARGET_ADMIN: &str = "starkbyte_server::admin";

/// Credential store operations.
pub const TRACING_TARGET_STORE: &str = "starkbyte_server::store";

/// Service state initialization.
pub const TRACING_TARGET_SERVICE: &str = "starkbyte_server::service";

/// HTTP handlers.
pub const TRACING_TARGET_HANDLER: &str = "starkbyte_server::handler";

/// Middleware.
pub const TRACING_TARGET_MIDDLEWARE: &str = "starkbyte_server::middleware";

/// Periodic cleanup of expired tokens.
pub const TRACING_TARGET_CLEANUP: &str = "starkbyte_server::cleanup";
