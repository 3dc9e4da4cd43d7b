//! Audit service wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;

use super::{AuditEvent, AuditProvider, TRACING_TARGET, TracingAuditProvider};

/// Fire-and-forget audit recorder.
///
/// [`AuditService::record`] returns immediately; the provider runs on a
/// spawned task and its failures are logged, never propagated.
#[derive(Clone)]
pub struct AuditService {
    inner: Arc<dyn AuditProvider>,
}

impl fmt::Debug for AuditService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditService").finish_non_exhaustive()
    }
}

impl Default for AuditService {
    fn default() -> Self {
        Self::new(TracingAuditProvider)
    }
}

impl AuditService {
    /// Creates a new audit service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: AuditProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Records `event` on a background task.
    ///
    /// Must be called from within a Tokio runtime. The handle may be
    /// dropped; awaiting it only waits for the provider to finish.
    pub fn record(&self, event: AuditEvent) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let started_at = Instant::now();
            match inner.record(&event).await {
                Ok(()) => tracing::debug!(
                    target: TRACING_TARGET,
                    action = event.action.as_str(),
                    actor_id = ?event.actor_id,
                    elapsed_ms = started_at.elapsed().as_millis(),
                    "Audit event recorded"
                ),
                Err(error) => tracing::error!(
                    target: TRACING_TARGET,
                    action = event.action.as_str(),
                    actor_id = ?event.actor_id,
                    error = %error,
                    "Failed to record audit event"
                ),
            }
        })
    }
}
