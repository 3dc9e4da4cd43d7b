//! Service layer error to HTTP error conversion.

use super::http_error::{Error as HttpError, ErrorKind};
use crate::tracing_targets::TRACING_TARGET_HANDLER;
use crate::{Error as ServiceError, ErrorKind as ServiceErrorKind};

impl From<ServiceError> for HttpError<'static> {
    fn from(error: ServiceError) -> Self {
        let kind = match error.kind() {
            ServiceErrorKind::Unauthenticated => ErrorKind::Unauthorized,
            ServiceErrorKind::Forbidden => ErrorKind::Forbidden,
            ServiceErrorKind::NotFound => ErrorKind::NotFound,
            ServiceErrorKind::Conflict => ErrorKind::Conflict,
            ServiceErrorKind::InUse => ErrorKind::InUse,
            ServiceErrorKind::Invalid => ErrorKind::Invalid,
            ServiceErrorKind::Config | ServiceErrorKind::External | ServiceErrorKind::Internal => {
                tracing::error!(
                    target: TRACING_TARGET_HANDLER,
                    error = %error,
                    source = ?std::error::Error::source(&error),
                    "request failed with a server error"
                );
                // Infrastructure details stay in the logs.
                return ErrorKind::InternalServerError.into_error();
            }
        };

        tracing::debug!(
            target: TRACING_TARGET_HANDLER,
            kind = %error.kind(),
            message = error.message(),
            "request rejected"
        );

        kind.with_message(error.message().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_http_kinds() {
        let cases = [
            (ServiceError::unauthenticated("x"), ErrorKind::Unauthorized),
            (ServiceError::forbidden("x"), ErrorKind::Forbidden),
            (ServiceError::not_found("x"), ErrorKind::NotFound),
            (ServiceError::conflict("x"), ErrorKind::Conflict),
            (ServiceError::in_use("x"), ErrorKind::InUse),
            (ServiceError::invalid("x"), ErrorKind::Invalid),
            (ServiceError::internal("postgres", "x"), ErrorKind::InternalServerError),
            (ServiceError::config("x"), ErrorKind::InternalServerError),
        ];

        for (error, expected) in cases {
            assert_eq!(HttpError::from(error).kind(), expected);
        }
    }

    #[test]
    fn internal_messages_are_not_exposed() {
        let error = HttpError::from(ServiceError::internal("postgres", "connection refused"));
        assert_eq!(error.message(), None);
    }
}
