//! Authenticated session extractor.

use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use derive_more::Deref;

use crate::handler::{Error, Result};
use crate::service::session::{Resolution, Session, SessionResolver};
use crate::tracing_targets::TRACING_TARGET_AUTHENTICATION;

/// The resolved session of the current request.
///
/// Resolution runs once per request; later extractions (middleware, then
/// handler) reuse the copy cached in the request extensions.
#[derive(Debug, Clone, Deref, PartialEq, Eq)]
pub struct AuthState(pub Session);

impl AuthState {
    /// Consumes the state, returning the session.
    #[inline]
    pub fn into_session(self) -> Session {
        self.0
    }

    async fn resolve(parts: &mut Parts, resolver: &SessionResolver) -> Result<Resolution> {
        let resolution = resolver.resolve_headers(&parts.headers).await?;
        if let Resolution::Authenticated(session) = &resolution {
            parts.extensions.insert(Self(session.as_ref().clone()));
        }

        Ok(resolution)
    }
}

impl<S> FromRequestParts<S> for AuthState
where
    S: Sync + Send,
    SessionResolver: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth_state) = parts.extensions.get::<Self>() {
            return Ok(auth_state.clone());
        }

        let resolver = SessionResolver::from_ref(state);
        match Self::resolve(parts, &resolver).await? {
            Resolution::Authenticated(session) => Ok(Self(*session)),
            Resolution::Rejected(rejection) => {
                tracing::debug!(
                    target: TRACING_TARGET_AUTHENTICATION,
                    rejection = rejection.as_str(),
                    "request is not authenticated"
                );
                Err(crate::Error::from(rejection).into())
            }
        }
    }
}

impl<S> OptionalFromRequestParts<S> for AuthState
where
    S: Sync + Send,
    SessionResolver: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        if let Some(auth_state) = parts.extensions.get::<Self>() {
            return Ok(Some(auth_state.clone()));
        }

        let resolver = SessionResolver::from_ref(state);
        let resolution = Self::resolve(parts, &resolver).await?;
        Ok(match resolution {
            Resolution::Authenticated(session) => Some(Self(*session)),
            Resolution::Rejected(_) => None,
        })
    }
}
