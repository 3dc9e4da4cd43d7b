//! Error response body.

use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON body of every error response.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse<'a> {
    /// Machine-readable error name, e.g. `in_use`.
    pub name: Cow<'a, str>,
    /// Human-readable message.
    pub message: Cow<'a, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Cow<'a, str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Cow<'a, str>>,

    #[serde(skip)]
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        "The request could not be parsed.",
        StatusCode::BAD_REQUEST,
    );
    pub const INVALID: Self = Self::new(
        "invalid",
        "The request was rejected.",
        StatusCode::BAD_REQUEST,
    );
    pub const UNAUTHORIZED: Self = Self::new(
        "unauthorized",
        "A valid session is required.",
        StatusCode::UNAUTHORIZED,
    );
    pub const FORBIDDEN: Self = Self::new(
        "forbidden",
        "The session lacks the required permission.",
        StatusCode::FORBIDDEN,
    );
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        "No such resource.",
        StatusCode::NOT_FOUND,
    );
    pub const CONFLICT: Self = Self::new(
        "conflict",
        "The name is already taken.",
        StatusCode::CONFLICT,
    );
    pub const IN_USE: Self = Self::new(
        "in_use",
        "The resource is still referenced.",
        StatusCode::CONFLICT,
    );
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "Something went wrong on our side.",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const SERVICE_UNAVAILABLE: Self = Self::new(
        "service_unavailable",
        "Try again shortly.",
        StatusCode::SERVICE_UNAVAILABLE,
    );

    #[inline]
    pub const fn new(name: &'a str, message: &'a str, status: StatusCode) -> Self {
        Self {
            name: Cow::Borrowed(name),
            message: Cow::Borrowed(message),
            resource: None,
            context: None,
            status,
        }
    }

    pub fn with_message(self, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            message: message.into(),
            ..self
        }
    }

    pub fn with_resource(self, resource: impl Into<Cow<'a, str>>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..self
        }
    }

    /// Adds `context`, joining it to any earlier context with `; `.
    pub fn with_context(self, context: impl Into<Cow<'a, str>>) -> Self {
        let context = context.into();
        let context = match self.context {
            Some(earlier) => Cow::Owned(format!("{earlier}; {context}")),
            None => context,
        };
        Self {
            context: Some(context),
            ..self
        }
    }
}

impl IntoResponse for ErrorResponse<'_> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_omitted() -> anyhow::Result<()> {
        let body = serde_json::to_value(ErrorResponse::NOT_FOUND)?;
        assert_eq!(
            body,
            serde_json::json!({ "name": "not_found", "message": "No such resource." })
        );

        let body = serde_json::to_value(
            ErrorResponse::IN_USE
                .with_message("Role is assigned to 1 user(s)")
                .with_resource("role"),
        )?;
        assert_eq!(body["name"], "in_use");
        assert_eq!(body["message"], "Role is assigned to 1 user(s)");
        assert_eq!(body["resource"], "role");
        assert!(body.get("context").is_none());
        Ok(())
    }
}
