#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Schema migrations compiled into the binary.
pub(crate) const MIGRATIONS: diesel_migrations::EmbeddedMigrations =
    diesel_migrations::embed_migrations!();

/// Pool construction and client lifecycle.
pub const TRACING_TARGET_CLIENT: &str = "starkbyte_postgres::client";
/// Embedded schema migrations.
pub const TRACING_TARGET_MIGRATION: &str = "starkbyte_postgres::migration";
/// Connection checkout, setup and recycling.
pub const TRACING_TARGET_CONNECTION: &str = "starkbyte_postgres::connection";

mod client;
pub mod model;
pub mod query;
mod schema;
pub mod types;

use std::borrow::Cow;

use deadpool::managed::TimeoutType;
use diesel::ConnectionError;
use diesel::result::{DatabaseErrorKind, Error};
pub use diesel_async::AsyncPgConnection as PgConnection;

pub use crate::client::{
    ConnectionPool, PgClient, PgClientMigrationExt, PgConfig, PgConn, PgPoolStatus,
    PooledConnection, run_pending_migrations,
};
use crate::types::ConstraintViolation;

pub mod error {
    //! Driver and pool error types surfaced through [`PgError`].
    //!
    //! [`PgError`]: crate::PgError

    /// Boxed source of a failed migration.
    pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

    pub use deadpool::managed::TimeoutType;
    pub use diesel::result::{ConnectionError as DieselConnectionError, Error as DieselError};
    pub use diesel_async::pooled_connection::PoolError as DieselPoolError;
    pub use diesel_async::pooled_connection::deadpool::PoolError as DeadpoolError;
}

/// Failure of a credential, role or token query against PostgreSQL.
#[derive(Debug, thiserror::Error)]
#[must_use = "database errors should be handled appropriately"]
pub enum PgError {
    /// The connection settings are unusable.
    #[error("invalid database configuration: {0}")]
    Config(String),

    /// No connection could be created, checked out or recycled in time.
    #[error("database timed out ({0:?})")]
    Timeout(TimeoutType),

    #[error("database connection failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("schema migration failed: {0}")]
    Migration(error::BoxError),

    /// The statement itself failed, constraint violations included.
    #[error("database query failed: {0}")]
    Query(#[from] Error),

    #[error("unexpected database failure: {0}")]
    Unexpected(Cow<'static, str>),
}

impl PgError {
    /// Name of the violated constraint, when the database reported one.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::Query(Error::DatabaseError(_, info)) => info.constraint_name(),
            _ => None,
        }
    }

    /// The violated constraint, when it belongs to the authorization schema.
    pub fn constraint_violation(&self) -> Option<ConstraintViolation> {
        self.constraint().and_then(ConstraintViolation::new)
    }

    /// Whether the transaction lost a serialization race with a concurrent writer.
    pub fn is_serialization_failure(&self) -> bool {
        matches!(
            self,
            Self::Query(Error::DatabaseError(DatabaseErrorKind::SerializationFailure, _))
        )
    }

    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        self.is_serialization_failure()
            || matches!(
                self,
                Self::Timeout(_) | Self::Connection(ConnectionError::BadConnection(_))
            )
    }
}

impl From<error::DeadpoolError> for PgError {
    fn from(value: error::DeadpoolError) -> Self {
        use error::{DeadpoolError, DieselPoolError};

        match value {
            DeadpoolError::Timeout(kind) => Self::Timeout(kind),
            DeadpoolError::Backend(DieselPoolError::QueryError(err)) => Self::Query(err),
            DeadpoolError::Backend(DieselPoolError::ConnectionError(err)) => Self::Connection(err),
            DeadpoolError::PostCreateHook(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_CONNECTION,
                    error = %err,
                    "post-create hook rejected a connection"
                );
                Self::Unexpected(err.to_string().into())
            }
            DeadpoolError::NoRuntimeSpecified => Self::Unexpected("pool built without a runtime".into()),
            DeadpoolError::Closed => Self::Unexpected("pool is closed".into()),
        }
    }
}

/// Specialized [`Result`] type for database operations.
pub type PgResult<T, E = PgError> = Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_query_errors_have_no_constraint() {
        let error = PgError::Config("missing url".into());
        assert!(error.constraint().is_none());
        assert!(error.constraint_violation().is_none());
        assert!(!error.is_transient());
    }

    #[test]
    fn pool_timeouts_are_transient() {
        let error = PgError::Timeout(TimeoutType::Wait);
        assert!(error.is_transient());
        assert!(!error.is_serialization_failure());
    }

    #[test]
    fn closed_pool_is_not_transient() {
        let error = PgError::from(error::DeadpoolError::Closed);
        assert!(matches!(error, PgError::Unexpected(_)));
        assert!(!error.is_transient());
    }
}
