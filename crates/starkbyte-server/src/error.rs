//! Service layer error types.
//!
//! [`ErrorKind`] carries the authorization taxonomy (`Unauthenticated`,
//! `Forbidden`, `NotFound`, `Conflict`, `InUse`, `Invalid`) plus the
//! infrastructure kinds that never reach a client as anything but a 500.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use starkbyte_postgres::PgError;
use starkbyte_postgres::types::{ConstraintCategory, ConstraintViolation};

use crate::tracing_targets::TRACING_TARGET_STORE;

/// Type alias for boxed errors that are Send + Sync.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type alias for service layer operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error kind enumeration for categorizing service layer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing, invalid, expired or revoked session.
    Unauthenticated,
    /// Authenticated, but lacking the required permission or ownership.
    Forbidden,
    /// Referenced entity does not exist.
    NotFound,
    /// Uniqueness violation.
    Conflict,
    /// Role deletion blocked by users still holding it.
    InUse,
    /// Malformed input, unknown permission names, bad reset tokens.
    Invalid,
    /// Configuration-related errors.
    Config,
    /// External service communication errors.
    External,
    /// Internal service logic errors.
    Internal,
}

impl ErrorKind {
    /// Returns the error kind as a string for categorization.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InUse => "in_use",
            Self::Invalid => "invalid",
            Self::Config => "config",
            Self::External => "external_service",
            Self::Internal => "internal_service",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service layer error with structured information.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    /// Creates a new [`Error`].
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a source error to this error.
    #[inline]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn unauthenticated(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    #[inline]
    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    #[inline]
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    #[inline]
    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    #[inline]
    pub fn in_use(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InUse, message)
    }

    #[inline]
    pub fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Invalid, message)
    }

    /// Creates a new configuration error.
    #[inline]
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Creates a new external service error.
    #[inline]
    pub fn external(
        service: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let full_message = format!("{}: {}", service.into(), message.into());
        Self::new(ErrorKind::External, full_message)
    }

    /// Creates a new internal service error.
    #[inline]
    pub fn internal(
        service: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let full_message = format!("{}: {}", service.into(), message.into());
        Self::new(ErrorKind::Internal, full_message)
    }
}

impl From<ConstraintViolation> for Error {
    fn from(violation: ConstraintViolation) -> Self {
        match violation {
            ConstraintViolation::UserEmailTaken => {
                Self::conflict("A user with this email already exists")
            }
            ConstraintViolation::RoleNameTaken => {
                Self::conflict("A role with this name already exists")
            }
            ConstraintViolation::PermissionNameTaken => {
                Self::conflict("A permission with this name already exists")
            }
            ConstraintViolation::UserRoleReference => {
                Self::in_use("The role is still assigned to users")
            }
            other => match other.categorize() {
                ConstraintCategory::Validation | ConstraintCategory::Chronological => {
                    Self::invalid(format!("Constraint violated: {}", other))
                }
                ConstraintCategory::Uniqueness => {
                    Self::conflict(format!("Constraint violated: {}", other))
                }
                ConstraintCategory::Reference => {
                    Self::invalid(format!("Referenced entity does not exist: {}", other))
                }
            },
        }
    }
}

impl From<PgError> for Error {
    fn from(error: PgError) -> Self {
        if let Some(violation) = error.constraint_violation() {
            tracing::debug!(
                target: TRACING_TARGET_STORE,
                constraint = %violation,
                "constraint violation"
            );
            return Self::from(violation).with_source(error);
        }

        tracing::error!(
            target: TRACING_TARGET_STORE,
            error = %error,
            transient = error.is_transient(),
            "database error"
        );
        Self::internal("postgres", "Database operation failed").with_source(error)
    }
}

impl From<starkbyte_service::Error> for Error {
    fn from(error: starkbyte_service::Error) -> Self {
        use starkbyte_service::ErrorKind as ServiceErrorKind;

        match error.kind {
            ServiceErrorKind::Malformed => {
                Self::invalid("Malformed message for external service").with_source(error)
            }
            _ => Self::external("service", "External service failed").with_source(error),
        }
    }
}
