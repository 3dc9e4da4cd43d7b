use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::extract::AuthState;

/// Rejects requests without a valid session.
///
/// The resolved [`AuthState`] stays in the request extensions, so handlers
/// extracting it again do not hit the store twice.
pub async fn require_authentication(
    AuthState(_): AuthState,
    request: Request,
    next: Next,
) -> Response {
    next.run(request).await
}
