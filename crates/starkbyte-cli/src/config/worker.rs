//! Background cleanup configuration.

use std::time::Duration;

use anyhow::{Result as AnyhowResult, anyhow};
use clap::Args;
use serde::{Deserialize, Serialize};

/// Configuration of the expired token cleanup worker.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct WorkerConfig {
    /// Seconds between purges of expired reset tokens and revocations.
    #[arg(long = "cleanup-interval", env = "CLEANUP_INTERVAL", default_value_t = 300)]
    pub cleanup_interval_secs: u64,
}

impl WorkerConfig {
    pub fn validate(&self) -> AnyhowResult<()> {
        if self.cleanup_interval_secs == 0 {
            return Err(anyhow!("Cleanup interval must be at least 1 second."));
        }
        Ok(())
    }

    #[must_use]
    pub const fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_secs: 300,
        }
    }
}
