//! Audit trail for administrative and account mutations.
//!
//! - [`AuditProvider`]: sink that persists or forwards an [`AuditEvent`]
//! - [`AuditService`]: wrapper that records on a background task with logging
//!
//! ```rust,ignore
//! use starkbyte_service::audit::{AuditAction, AuditEvent, AuditService};
//!
//! let audit = AuditService::new(my_provider);
//! audit.record(AuditEvent::new(AuditAction::RoleCreated).with_actor(admin_id));
//! ```

mod event;
#[cfg(feature = "test-utils")]
mod mock;
mod service;

pub use event::{AuditAction, AuditEvent};
#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use mock::MockAuditProvider;
pub use service::AuditService;

pub use crate::{Error, Result};

/// Tracing target for audit operations.
pub const TRACING_TARGET: &str = "starkbyte_service::audit";

/// Sink for audit events.
#[async_trait::async_trait]
pub trait AuditProvider: Send + Sync {
    /// Persists a single event.
    async fn record(&self, event: &AuditEvent) -> Result<()>;
}

/// Provider that writes events to the tracing log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditProvider;

#[async_trait::async_trait]
impl AuditProvider for TracingAuditProvider {
    async fn record(&self, event: &AuditEvent) -> Result<()> {
        tracing::info!(
            target: TRACING_TARGET,
            action = event.action.as_str(),
            actor_id = ?event.actor_id,
            metadata = %event.metadata,
            "Audit event"
        );
        Ok(())
    }
}
