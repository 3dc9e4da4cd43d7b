//! Error responses for timeouts and panics.

use std::any::Any;
use std::future::ready;

use axum::response::{IntoResponse, Response};
use futures::future::{BoxFuture, FutureExt};

use crate::handler::{Error, ErrorKind};
use crate::tracing_targets::TRACING_TARGET_MIDDLEWARE;

type ResponseFut = BoxFuture<'static, Response>;
type Panic = Box<dyn Any + Send + 'static>;

/// Converts errors of fallible layers into responses.
pub fn handle_error(err: tower::BoxError) -> ResponseFut {
    use tower::timeout::error::Elapsed;

    let error = if err.is::<Elapsed>() {
        tracing::error!(
            target: TRACING_TARGET_MIDDLEWARE,
            error = %err,
            "request timeout exceeded"
        );

        Error::new(ErrorKind::ServiceUnavailable).with_message("Request timed out")
    } else {
        tracing::error!(
            target: TRACING_TARGET_MIDDLEWARE,
            error = %err,
            "unknown middleware error"
        );

        Error::new(ErrorKind::InternalServerError)
    };

    ready(error.into_response()).boxed()
}

/// Logs a handler panic and answers with a 500.
pub fn catch_panic(err: Panic) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic type");

    tracing::error!(
        target: TRACING_TARGET_MIDDLEWARE,
        panic = message,
        "service panic"
    );

    ErrorKind::InternalServerError.into_response()
}
