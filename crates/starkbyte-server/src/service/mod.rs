//! Application state and dependency injection.

pub mod account;
pub mod admin;
pub mod auth;
mod config;
mod health;
pub mod security;
pub mod session;
pub mod store;

use std::sync::Arc;

use starkbyte_postgres::PgClient;
use starkbyte_service::{AuditService, MailService, TracingMailProvider};

pub use crate::service::account::{AccountService, MailConfig, PasswordResetConfig};
pub use crate::service::admin::{RoleAdmin, UserAdmin};
pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder};
pub use crate::service::health::HealthCache;
pub use crate::service::security::{
    PasswordHasher, SessionCarrier, SessionClaims, SessionCodec, SessionConfig,
};
pub use crate::service::session::{Resolution, Session, SessionRejection, SessionResolver};
#[cfg(any(test, feature = "test-utils"))]
use crate::service::store::MemoryStore;
use crate::service::store::{CredentialStore, PgAuditProvider, PgStore, RevocationStore};
use crate::tracing_targets::TRACING_TARGET_SERVICE;
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    // External services:
    pub postgres: Option<PgClient>,

    // Internal services:
    pub session_codec: SessionCodec,
    pub session_resolver: SessionResolver,
    pub account_service: AccountService,
    pub role_admin: RoleAdmin,
    pub user_admin: UserAdmin,
    pub health_cache: HealthCache,
}

/// Shared building blocks of a [`ServiceState`].
struct StateParts {
    postgres: Option<PgClient>,
    store: Arc<dyn CredentialStore>,
    revocations: Arc<dyn RevocationStore>,
    hasher: PasswordHasher,
    audit: AuditService,
    mail: MailService,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects to Postgres, applies migrations and makes sure the default
    /// role exists.
    pub async fn new(service_config: &ServiceConfig) -> Result<Self> {
        service_config.validate()?;
        let postgres = service_config.connect_postgres().await?;
        let store = PgStore::new(postgres.clone());

        let parts = StateParts {
            postgres: Some(postgres.clone()),
            store: Arc::new(store.clone()),
            revocations: Arc::new(store),
            hasher: PasswordHasher::new()?,
            audit: AuditService::new(PgAuditProvider::new(postgres)),
            mail: MailService::new(TracingMailProvider),
        };

        Self::assemble(parts, service_config).await
    }

    /// Builds state over an in-memory store.
    ///
    /// Uses a cheap password hashing cost; not for production.
    #[cfg(any(test, feature = "test-utils"))]
    #[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
    pub async fn from_memory(
        store: MemoryStore,
        audit: AuditService,
        mail: MailService,
        session: SessionConfig,
    ) -> Result<Self> {
        let service_config = ServiceConfig {
            postgres: starkbyte_postgres::PgConfig::new("postgresql://unused"),
            session,
            password_reset: PasswordResetConfig::default(),
            mail: MailConfig::default(),
        };

        let parts = StateParts {
            postgres: None,
            store: Arc::new(store.clone()),
            revocations: Arc::new(store),
            hasher: PasswordHasher::with_cost(1024, 1)?,
            audit,
            mail,
        };

        Self::assemble(parts, &service_config).await
    }

    async fn assemble(parts: StateParts, service_config: &ServiceConfig) -> Result<Self> {
        let session_codec = SessionCodec::from_config(&service_config.session)?;
        let revocation_check = service_config
            .session
            .session_check_revocation
            .then(|| parts.revocations.clone());

        let account_service = AccountService::new(
            parts.store.clone(),
            parts.revocations,
            parts.hasher,
            session_codec.clone(),
            parts.audit.clone(),
            parts.mail,
            service_config.password_reset.clone(),
            service_config.mail.clone(),
        );
        let default_role = account_service.ensure_default_role().await?;

        let service_state = Self {
            health_cache: HealthCache::new(parts.postgres.clone()),
            postgres: parts.postgres,
            session_resolver: SessionResolver::new(
                session_codec.clone(),
                parts.store.clone(),
                revocation_check,
            ),
            role_admin: RoleAdmin::new(parts.store.clone(), parts.audit.clone()),
            user_admin: UserAdmin::new(parts.store, parts.audit),
            session_codec,
            account_service,
        };

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            carrier = %service_config.session.session_carrier,
            revocation_check = service_config.session.session_check_revocation,
            default_role = %default_role.name,
            "service state initialized"
        );

        Ok(service_state)
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(session_codec: SessionCodec);
impl_di!(session_resolver: SessionResolver);
impl_di!(account_service: AccountService);
impl_di!(role_admin: RoleAdmin);
impl_di!(user_admin: UserAdmin);
impl_di!(health_cache: HealthCache);
