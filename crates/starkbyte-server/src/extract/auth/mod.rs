//! Session extraction and the session cookie.

mod auth_state;
mod session_cookie;

pub use auth_state::AuthState;
pub use session_cookie::SessionCookie;
