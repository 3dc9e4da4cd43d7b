//! Cached database health.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use starkbyte_postgres::PgClient;
use tokio::sync::RwLock;

use crate::tracing_targets::TRACING_TARGET_SERVICE;

/// Default cache duration for health checks.
const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct HealthCacheEntry {
    is_healthy: AtomicBool,
    last_check: RwLock<Option<Instant>>,
    cache_duration: Duration,
}

impl HealthCacheEntry {
    async fn get_or_update<F, Fut>(&self, check_fn: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        let now = Instant::now();
        if let Some(last_check) = *self.last_check.read().await
            && now.duration_since(last_check) < self.cache_duration
        {
            return self.is_healthy.load(Ordering::Relaxed);
        }

        let healthy = check_fn().await;
        self.is_healthy.store(healthy, Ordering::Relaxed);
        *self.last_check.write().await = Some(now);

        healthy
    }
}

/// Database health with a short-lived cached answer.
///
/// Without a Postgres client (in-memory store) the service is always healthy.
#[derive(Debug, Clone)]
pub struct HealthCache {
    postgres: Option<PgClient>,
    cache: Arc<HealthCacheEntry>,
}

impl HealthCache {
    pub fn new(postgres: Option<PgClient>) -> Self {
        Self::with_cache_duration(postgres, DEFAULT_CACHE_DURATION)
    }

    pub fn with_cache_duration(postgres: Option<PgClient>, cache_duration: Duration) -> Self {
        Self {
            postgres,
            cache: Arc::new(HealthCacheEntry {
                is_healthy: AtomicBool::new(false),
                last_check: RwLock::new(None),
                cache_duration,
            }),
        }
    }

    /// Returns whether the database answers, reusing a recent result.
    pub async fn is_healthy(&self) -> bool {
        let Some(postgres) = &self.postgres else {
            return true;
        };

        self.cache
            .get_or_update(|| async {
                match postgres.ping().await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(
                            target: TRACING_TARGET_SERVICE,
                            error = %e,
                            "database health check failed"
                        );
                        false
                    }
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[tokio::test]
    async fn cached_result_is_reused() {
        let entry = HealthCacheEntry {
            is_healthy: AtomicBool::new(false),
            last_check: RwLock::new(None),
            cache_duration: Duration::from_secs(60),
        };
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let healthy = entry
                .get_or_update(|| async {
                    calls.fetch_add(1, Ordering::Relaxed);
                    true
                })
                .await;
            assert!(healthy);
        }

        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn memory_mode_is_healthy() {
        assert!(HealthCache::new(None).is_healthy().await);
    }
}
