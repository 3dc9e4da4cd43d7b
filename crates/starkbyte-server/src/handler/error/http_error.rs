use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::response::ErrorResponse;

/// The error type returned by handlers and extractors.
///
/// Wraps the [`ErrorResponse`] body that is sent to the client, so every
/// builder call edits exactly what the client will see.
#[derive(Debug, Clone)]
#[must_use = "errors do nothing unless serialized"]
pub struct Error<'a> {
    kind: ErrorKind,
    body: ErrorResponse<'a>,
}

impl Error<'static> {
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            body: kind.response(),
        }
    }
}

impl<'a> Error<'a> {
    /// Appends detail for the client, separated by `; ` from earlier context.
    #[inline]
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        self.body = self.body.with_context(context);
        self
    }

    /// Replaces the stock message of the kind.
    #[inline]
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        self.body = self.body.with_message(message);
        self
    }

    /// Names the kind of resource involved, e.g. `role`.
    #[inline]
    pub fn with_resource(mut self, resource: impl Into<Cow<'a, str>>) -> Self {
        self.body = self.body.with_resource(resource);
        self
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.body.context.as_deref()
    }

    /// The message, when it differs from the kind's stock message.
    pub fn message(&self) -> Option<&str> {
        let message: &str = &self.body.message;
        (message != &*self.kind.response().message).then_some(message)
    }

    #[inline]
    pub fn resource(&self) -> Option<&str> {
        self.body.resource.as_deref()
    }

    pub fn into_static(self) -> Error<'static> {
        let body = self.body;
        Error {
            kind: self.kind,
            body: ErrorResponse {
                name: owned(body.name),
                message: owned(body.message),
                resource: body.resource.map(owned),
                context: body.context.map(owned),
                status: body.status,
            },
        }
    }
}

fn owned(value: Cow<'_, str>) -> Cow<'static, str> {
    Cow::Owned(value.into_owned())
}

impl Default for Error<'static> {
    #[inline]
    fn default() -> Self {
        Self::new(ErrorKind::default())
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = &self.body;
        write!(f, "{} {}: {}", body.status.as_u16(), body.name, body.message)?;
        if let Some(resource) = &body.resource {
            write!(f, " ({resource})")?;
        }
        if let Some(context) = &body.context {
            write!(f, "; {context}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    #[inline]
    fn into_response(self) -> Response {
        self.body.into_response()
    }
}

impl From<ErrorKind> for Error<'static> {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Specialized [`Result`] type for HTTP handlers.
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// What went wrong, from the client's point of view.
///
/// `Invalid` covers well-formed requests the hub refuses (unknown permission
/// names, short passwords, spent reset tokens); `BadRequest` covers bodies,
/// paths and queries that failed to parse.
#[must_use = "error kinds do nothing unless used to create errors"]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Invalid,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    /// A role that still has holders.
    InUse,

    #[default]
    InternalServerError,
    ServiceUnavailable,
}

impl ErrorKind {
    #[inline]
    pub fn into_error(self) -> Error<'static> {
        Error::new(self)
    }

    #[inline]
    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }

    #[inline]
    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    #[inline]
    pub fn with_resource<'a>(self, resource: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_resource(resource)
    }

    #[inline]
    pub fn status_code(self) -> StatusCode {
        self.response().status
    }

    /// Stock body for this kind.
    pub fn response(self) -> ErrorResponse<'static> {
        match self {
            Self::BadRequest => ErrorResponse::BAD_REQUEST,
            Self::Invalid => ErrorResponse::INVALID,
            Self::Unauthorized => ErrorResponse::UNAUTHORIZED,
            Self::Forbidden => ErrorResponse::FORBIDDEN,
            Self::NotFound => ErrorResponse::NOT_FOUND,
            Self::Conflict => ErrorResponse::CONFLICT,
            Self::InUse => ErrorResponse::IN_USE,
            Self::InternalServerError => ErrorResponse::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => ErrorResponse::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.response().name)
    }
}

impl IntoResponse for ErrorKind {
    #[inline]
    fn into_response(self) -> Response {
        self.response().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_an_opaque_500() {
        let error = Error::default();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert_eq!(error.message(), None);
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn builders_fill_the_body() {
        let error = ErrorKind::NotFound
            .with_message("Role not found")
            .with_resource("role")
            .with_context("roleId");

        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.message(), Some("Role not found"));
        assert_eq!(error.resource(), Some("role"));
        assert_eq!(error.context(), Some("roleId"));
    }

    #[test]
    fn display_leads_with_status_and_name() {
        let error = ErrorKind::InUse
            .with_message("Role is assigned to 2 user(s)")
            .with_resource("role");

        assert_eq!(
            error.to_string(),
            "409 in_use: Role is assigned to 2 user(s) (role)"
        );
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ErrorKind::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::InUse.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::Invalid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Invalid.to_string(), "invalid");
    }

    #[test]
    fn borrowed_parts_become_owned() {
        let resource = String::from("permission");
        let error = ErrorKind::Conflict.with_resource(resource.as_str()).into_static();
        drop(resource);

        assert_eq!(error.resource(), Some("permission"));
    }
}
