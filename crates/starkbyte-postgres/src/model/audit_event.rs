use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::audit_events;

/// An append-only record of an administrative or account mutation.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = audit_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuditEvent {
    pub id: Uuid,
    /// User who performed the action, absent for anonymous flows.
    pub actor_id: Option<Uuid>,
    /// Dotted action name, e.g. `role.create`.
    pub action: String,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}

/// Data for appending an audit event.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewAuditEvent {
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub metadata: serde_json::Value,
}
