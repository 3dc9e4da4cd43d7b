//! Periodic purge of expired reset tokens and session revocations.

use std::time::Duration;

use jiff::Timestamp;
use starkbyte_server::service::AccountService;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_WORKER;

/// Spawns the cleanup worker.
///
/// The first purge runs right away, then once per `interval` until `shutdown`
/// is cancelled. A failed purge is logged and retried on the next tick.
pub fn spawn_cleanup_worker(
    accounts: AccountService,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            target: TRACING_TARGET_WORKER,
            interval_secs = interval.as_secs(),
            "cleanup worker started"
        );

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => purge(&accounts).await,
            }
        }

        tracing::info!(target: TRACING_TARGET_WORKER, "cleanup worker stopped");
    })
}

async fn purge(accounts: &AccountService) {
    match accounts.purge_expired_tokens(Timestamp::now()).await {
        Ok(report) if report.reset_tokens + report.revocations > 0 => {
            tracing::info!(
                target: TRACING_TARGET_WORKER,
                reset_tokens = report.reset_tokens,
                revocations = report.revocations,
                "expired tokens purged"
            );
        }
        Ok(_) => {}
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET_WORKER,
                error = %error,
                "expired token purge failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use starkbyte_server::service::store::{MemoryStore, RevocationStore};
    use starkbyte_server::service::{ServiceState, SessionConfig};
    use starkbyte_service::{AuditService, MailService, MockAuditProvider, MockMailProvider};
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn purges_until_cancelled() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let state = ServiceState::from_memory(
            store.clone(),
            AuditService::new(MockAuditProvider::new()),
            MailService::new(MockMailProvider::new()),
            SessionConfig::new("0123456789abcdef0123456789abcdef"),
        )
        .await?;

        let past = Timestamp::now() - SignedDuration::from_secs(60);
        store.revoke_token(Uuid::now_v7(), Uuid::now_v7(), past).await?;
        assert_eq!(store.revocation_count().await, 1);

        let shutdown = CancellationToken::new();
        let worker = spawn_cleanup_worker(
            state.account_service.clone(),
            Duration::from_millis(10),
            shutdown.clone(),
        );

        let purged = tokio::time::timeout(Duration::from_secs(2), async {
            while store.revocation_count().await > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(purged.is_ok());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(2), worker).await??;
        Ok(())
    }
}
