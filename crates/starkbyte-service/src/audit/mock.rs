//! Recording audit provider for tests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};

use super::{AuditEvent, AuditProvider, Error, Result};

/// Audit provider that keeps every event in memory.
///
/// Clones share the same log, so a test can hand one clone to
/// [`AuditService`] and inspect another.
///
/// [`AuditService`]: super::AuditService
#[derive(Clone)]
pub struct MockAuditProvider {
    inner: Arc<MockInner>,
}

struct MockInner {
    events: Mutex<Vec<AuditEvent>>,
    attempts: watch::Sender<usize>,
    fail: bool,
}

impl MockAuditProvider {
    /// Creates a provider that accepts every event.
    pub fn new() -> Self {
        Self::with_failure(false)
    }

    /// Creates a provider that rejects every event after counting it.
    pub fn failing() -> Self {
        Self::with_failure(true)
    }

    fn with_failure(fail: bool) -> Self {
        let (attempts, _) = watch::channel(0);
        Self {
            inner: Arc::new(MockInner {
                events: Mutex::new(Vec::new()),
                attempts,
                fail,
            }),
        }
    }

    /// Returns the events accepted so far.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.inner.events.lock().await.clone()
    }

    /// Waits until at least `count` record calls happened, or `timeout` elapsed.
    ///
    /// Returns the accepted events at that point.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<AuditEvent> {
        let mut attempts = self.inner.attempts.subscribe();
        let _ = tokio::time::timeout(timeout, attempts.wait_for(|seen| *seen >= count)).await;
        self.events().await
    }
}

impl Default for MockAuditProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuditProvider for MockAuditProvider {
    async fn record(&self, event: &AuditEvent) -> Result<()> {
        let result = if self.inner.fail {
            Err(Error::unavailable("audit sink is down"))
        } else {
            self.inner.events.lock().await.push(event.clone());
            Ok(())
        };

        self.inner.attempts.send_modify(|seen| *seen += 1);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tracing::Level;

    use super::*;
    use crate::audit::{AuditAction, AuditService, TRACING_TARGET};
    use crate::test_support::CapturedLevels;

    #[tokio::test]
    async fn service_delivers_to_provider() -> anyhow::Result<()> {
        let provider = MockAuditProvider::new();
        let service = AuditService::new(provider.clone());

        service.record(AuditEvent::new(AuditAction::RoleCreated)).await?;

        let events = provider.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::RoleCreated);
        Ok(())
    }

    #[tokio::test]
    async fn failing_provider_does_not_panic_the_task() -> anyhow::Result<()> {
        let (captured, _guard) = CapturedLevels::install(TRACING_TARGET);
        let provider = MockAuditProvider::failing();
        let service = AuditService::new(provider.clone());

        service.record(AuditEvent::new(AuditAction::RoleDeleted)).await?;

        let events = provider.wait_for(1, Duration::from_secs(1)).await;
        assert!(events.is_empty());
        assert!(captured.levels().contains(&Level::ERROR));
        Ok(())
    }
}
