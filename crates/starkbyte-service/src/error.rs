//! Errors reported by audit and mail providers.
//!
//! Callers never surface these to HTTP clients: the services log them and
//! carry on with the request that triggered the side effect.

use std::borrow::Cow;

/// Boxed cause attached to an [`Error`].
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a provider could not deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The message or event was malformed, e.g. an address without `@`.
    Malformed,
    /// The sink was reached and refused.
    Rejected,
    /// The sink could not be reached.
    Unavailable,
}

#[derive(Debug, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: Cow<'static, str>,
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn malformed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Malformed, message)
    }

    pub fn rejected(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Rejected, message)
    }

    pub fn unavailable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether the same delivery could succeed later.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn display_names_kind_and_message() {
        let error = Error::rejected("smtp relay refused");
        assert_eq!(error.to_string(), "Rejected: smtp relay refused");
        assert!(error.source().is_none());
    }

    #[test]
    fn only_unavailable_sinks_are_retryable() {
        let io = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        let error = Error::unavailable("audit store down").with_source(io);

        assert!(error.is_retryable());
        assert!(error.source().is_some());
        assert!(!Error::malformed("no recipient").is_retryable());
    }
}
