use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::Pagination;
use crate::model::{AuditEvent, NewAuditEvent};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for the append-only audit log.
pub trait AuditEventRepository {
    /// Appends an audit event.
    fn create_audit_event(
        &mut self,
        new_event: NewAuditEvent,
    ) -> impl Future<Output = PgResult<AuditEvent>> + Send;

    /// Lists audit events, newest first.
    fn list_audit_events(
        &mut self,
        pagination: Pagination,
    ) -> impl Future<Output = PgResult<Vec<AuditEvent>>> + Send;
}

impl AuditEventRepository for PgConnection {
    async fn create_audit_event(&mut self, new_event: NewAuditEvent) -> PgResult<AuditEvent> {
        use schema::audit_events;

        diesel::insert_into(audit_events::table)
            .values(&new_event)
            .returning(AuditEvent::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn list_audit_events(&mut self, pagination: Pagination) -> PgResult<Vec<AuditEvent>> {
        use schema::audit_events::{self, dsl};

        audit_events::table
            .order(dsl::created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(AuditEvent::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }
}
