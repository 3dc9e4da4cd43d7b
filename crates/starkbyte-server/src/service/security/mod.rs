//! Password hashing and session token signing.

mod password_hasher;
mod session_codec;
mod session_config;

pub use password_hasher::PasswordHasher;
pub use session_codec::{SessionClaims, SessionCodec};
pub use session_config::{SessionCarrier, SessionConfig};
