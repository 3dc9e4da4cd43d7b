//! Outbound email.
//!
//! - [`MailProvider`]: transport that delivers a [`MailMessage`]
//! - [`MailService`]: wrapper that sends on a background task with logging
//!
//! Delivery is fire-and-forget: callers that must not reveal whether an
//! address exists respond before, and regardless of, the send outcome.

mod message;
#[cfg(feature = "test-utils")]
mod mock;
mod service;

pub use message::MailMessage;
#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use mock::MockMailProvider;
pub use service::MailService;

pub use crate::{Error, Result};

/// Tracing target for mail operations.
pub const TRACING_TARGET: &str = "starkbyte_service::mail";

/// Transport for outbound email.
#[async_trait::async_trait]
pub trait MailProvider: Send + Sync {
    /// Delivers a single message.
    async fn send(&self, message: &MailMessage) -> Result<()>;
}

/// Provider that logs messages instead of delivering them.
///
/// The body is logged at `debug` only, since it may carry a reset link.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMailProvider;

#[async_trait::async_trait]
impl MailProvider for TracingMailProvider {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        tracing::info!(
            target: TRACING_TARGET,
            to = %message.to,
            subject = %message.subject,
            "Email queued for delivery"
        );
        tracing::debug!(target: TRACING_TARGET, body = %message.body, "Email body");
        Ok(())
    }
}
