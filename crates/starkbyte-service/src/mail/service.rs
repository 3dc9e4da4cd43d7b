//! Mail service wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;

use super::{MailMessage, MailProvider, TRACING_TARGET, TracingMailProvider};

/// Fire-and-forget mail sender.
#[derive(Clone)]
pub struct MailService {
    inner: Arc<dyn MailProvider>,
}

impl fmt::Debug for MailService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailService").finish_non_exhaustive()
    }
}

impl Default for MailService {
    fn default() -> Self {
        Self::new(TracingMailProvider)
    }
}

impl MailService {
    /// Creates a new mail service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: MailProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Sends `message` on a background task.
    ///
    /// Delivery errors are logged and dropped. Must be called from within a
    /// Tokio runtime.
    pub fn send(&self, message: MailMessage) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let started_at = Instant::now();
            match inner.send(&message).await {
                Ok(()) => tracing::debug!(
                    target: TRACING_TARGET,
                    subject = %message.subject,
                    elapsed_ms = started_at.elapsed().as_millis(),
                    "Email sent"
                ),
                Err(error) => tracing::error!(
                    target: TRACING_TARGET,
                    subject = %message.subject,
                    error = %error,
                    "Failed to send email"
                ),
            }
        })
    }
}
