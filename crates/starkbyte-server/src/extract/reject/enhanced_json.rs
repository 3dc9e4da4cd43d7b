//! JSON body extractor and responder.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Json as AxumJson, Request};
use axum::response::{IntoResponse, Response};
use derive_more::{Deref, DerefMut, From};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{bad_request, unhandled};
use crate::handler::Error;

/// [`axum::Json`] with rejections rendered as [`Error`].
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let AxumJson(value) = AxumJson::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    #[inline]
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

impl From<JsonRejection> for Error<'static> {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(err) => {
                bad_request("Expected an application/json body", &err.body_text())
            }
            JsonRejection::JsonSyntaxError(err) => {
                bad_request("Request body is not valid JSON", &err.body_text())
            }
            JsonRejection::JsonDataError(err) => {
                bad_request("Request body has the wrong shape", &err.body_text())
            }
            JsonRejection::BytesRejection(err) => {
                bad_request("Request body could not be read", &err.body_text())
            }
            _ => unhandled("json"),
        }
    }
}
