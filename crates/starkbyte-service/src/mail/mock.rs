//! Recording mail provider for tests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};

use super::{Error, MailMessage, MailProvider, Result};

/// Mail provider that keeps every message in an outbox.
///
/// Clones share the same outbox.
#[derive(Clone)]
pub struct MockMailProvider {
    inner: Arc<MockInner>,
}

struct MockInner {
    outbox: Mutex<Vec<MailMessage>>,
    attempts: watch::Sender<usize>,
    fail: bool,
}

impl MockMailProvider {
    /// Creates a provider that accepts every message.
    pub fn new() -> Self {
        Self::with_failure(false)
    }

    /// Creates a provider that rejects every message after counting it.
    pub fn failing() -> Self {
        Self::with_failure(true)
    }

    fn with_failure(fail: bool) -> Self {
        let (attempts, _) = watch::channel(0);
        Self {
            inner: Arc::new(MockInner {
                outbox: Mutex::new(Vec::new()),
                attempts,
                fail,
            }),
        }
    }

    /// Returns the messages accepted so far.
    pub async fn outbox(&self) -> Vec<MailMessage> {
        self.inner.outbox.lock().await.clone()
    }

    /// Returns how many sends were attempted, accepted or not.
    pub fn attempts(&self) -> usize {
        *self.inner.attempts.borrow()
    }

    /// Waits until at least `count` sends were attempted, or `timeout` elapsed.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<MailMessage> {
        let mut attempts = self.inner.attempts.subscribe();
        let _ = tokio::time::timeout(timeout, attempts.wait_for(|seen| *seen >= count)).await;
        self.outbox().await
    }
}

impl Default for MockMailProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MailProvider for MockMailProvider {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        let result = if self.inner.fail {
            Err(Error::rejected("relay refused the message"))
        } else {
            self.inner.outbox.lock().await.push(message.clone());
            Ok(())
        };

        self.inner.attempts.send_modify(|seen| *seen += 1);
        result
    }
}
