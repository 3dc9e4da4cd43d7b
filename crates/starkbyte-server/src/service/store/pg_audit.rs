use starkbyte_postgres::PgClient;
use starkbyte_postgres::model::NewAuditEvent;
use starkbyte_postgres::query::AuditEventRepository;
use starkbyte_service::{AuditEvent, AuditProvider};

use crate::tracing_targets::TRACING_TARGET_STORE;

/// Audit provider that appends to the `audit_events` table.
#[derive(Debug, Clone)]
pub struct PgAuditProvider {
    client: PgClient,
}

impl PgAuditProvider {
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }
}

fn unavailable(error: starkbyte_postgres::PgError) -> starkbyte_service::Error {
    starkbyte_service::Error::unavailable("audit store unavailable").with_source(error)
}

#[async_trait::async_trait]
impl AuditProvider for PgAuditProvider {
    async fn record(&self, event: &AuditEvent) -> starkbyte_service::Result<()> {
        let mut conn = self.client.get_connection().await.map_err(unavailable)?;

        let new_event = NewAuditEvent {
            actor_id: event.actor_id,
            action: event.action.as_str().to_owned(),
            metadata: event.metadata.clone(),
        };

        let stored = conn.create_audit_event(new_event).await.map_err(unavailable)?;
        tracing::trace!(
            target: TRACING_TARGET_STORE,
            event_id = %stored.id,
            action = %stored.action,
            "audit event stored"
        );

        Ok(())
    }
}
