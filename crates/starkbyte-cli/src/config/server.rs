//! HTTP listener configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Result as AnyhowResult, bail};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Upper bound, in seconds, for both the request and the drain timeout.
const MAX_TIMEOUT_SECS: u64 = 300;

/// Where the hub listens and how long it waits on slow requests and on
/// in-flight requests during shutdown.
///
/// | Flag                 | Variable           | Default     |
/// |----------------------|--------------------|-------------|
/// | `--host`             | `HOST`             | `127.0.0.1` |
/// | `--port`, `-p`       | `PORT`             | `3000`      |
/// | `--request-timeout`  | `REQUEST_TIMEOUT`  | `30`        |
/// | `--shutdown-timeout` | `SHUTDOWN_TIMEOUT` | `30`        |
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct ServerConfig {
    /// Interface address to listen on.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    #[serde(default = "loopback")]
    pub host: IpAddr,

    /// Listening port, 1024 or above.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Seconds before an unfinished request is answered with 503.
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,

    /// Seconds granted to in-flight requests once shutdown begins.
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 30)]
    pub shutdown_timeout: u64,
}

fn loopback() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn check_timeout(name: &str, secs: u64) -> AnyhowResult<()> {
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        bail!("{name} timeout must be within 1..={MAX_TIMEOUT_SECS} seconds, got {secs}");
    }
    Ok(())
}

impl ServerConfig {
    /// Rejects privileged ports and out-of-range timeouts.
    pub fn validate(&self) -> AnyhowResult<()> {
        if self.port < 1024 {
            bail!(
                "port {} is privileged; pick a port in 1024..=65535",
                self.port
            );
        }
        check_timeout("request", self.request_timeout)?;
        check_timeout("shutdown", self.shutdown_timeout)?;
        Ok(())
    }

    #[must_use]
    pub const fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// Whether the listener accepts connections from other hosts.
    #[must_use]
    pub fn is_public(&self) -> bool {
        !self.host.is_loopback()
    }

    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            addr = %self.server_addr(),
            public = self.is_public(),
            request_timeout_secs = self.request_timeout,
            shutdown_timeout_secs = self.shutdown_timeout,
            "listener configuration"
        );
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: loopback(),
            port: 3000,
            request_timeout: 30,
            shutdown_timeout: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_local() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.is_public());
    }

    #[test]
    fn privileged_port_is_rejected() {
        let config = ServerConfig {
            port: 443,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn timeouts_are_bounded() {
        let mut config = ServerConfig::default();

        config.shutdown_timeout = 0;
        assert!(config.validate().is_err());

        config.shutdown_timeout = MAX_TIMEOUT_SECS + 1;
        assert!(config.validate().is_err());

        config.shutdown_timeout = MAX_TIMEOUT_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unspecified_host_is_public() {
        let config = ServerConfig {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8443,
            ..ServerConfig::default()
        };
        assert!(config.is_public());
        assert_eq!(config.server_addr().port(), 8443);
    }
}
