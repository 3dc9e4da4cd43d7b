//! Path parameter extractor.

use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequestParts, Path as AxumPath};
use axum::http::request::Parts;
use derive_more::{Deref, DerefMut, From};
use serde::de::DeserializeOwned;

use super::{bad_request, unhandled};
use crate::handler::Error;

/// [`axum::extract::Path`] with rejections rendered as [`Error`].
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AxumPath(value) = AxumPath::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

impl From<PathRejection> for Error<'static> {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => {
                let detail = err.body_text();
                let message = if detail.contains("UUID") || detail.contains("uuid") {
                    "Path identifiers must be UUIDs"
                } else {
                    "Path parameter has the wrong format"
                };
                bad_request(message, &detail)
            }
            PathRejection::MissingPathParams(err) => {
                bad_request("Path parameter is missing", &err.body_text())
            }
            _ => unhandled("path"),
        }
    }
}
