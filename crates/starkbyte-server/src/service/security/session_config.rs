//! Session token and carrier configuration.

use std::fmt;
use std::time::Duration;

#[cfg(any(test, feature = "config"))]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default values for session options.
mod defaults {
    /// One day.
    pub const TTL_SECS: u64 = 24 * 60 * 60;
    pub const ISSUER: &str = "starkbyte-hub";
    pub const AUDIENCE: &str = "starkbyte-hub:api";
    pub const COOKIE_NAME: &str = "starkbyte_session";
    /// HS256 keys shorter than the hash output are rejected.
    pub const MIN_SECRET_BYTES: usize = 32;
}

/// Where the session token travels on each request.
///
/// A deployment picks exactly one; the other is ignored.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString)]
#[cfg_attr(any(test, feature = "config"), derive(ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionCarrier {
    /// HTTP cookie named by [`SessionConfig::session_cookie_name`].
    #[default]
    Cookie,
    /// `Authorization: Bearer <token>` header.
    Bearer,
}

/// Session configuration, loaded once at startup.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(any(test, feature = "config"), derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct SessionConfig {
    /// Secret used to sign session tokens (HS256, at least 32 bytes).
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "SESSION_SECRET", hide_env_values = true)
    )]
    pub session_secret: String,

    /// Session lifetime in seconds.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "SESSION_TTL_SECS", default_value_t = defaults::TTL_SECS)
    )]
    #[serde(default = "SessionConfig::default_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Token issuer (`iss`).
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "SESSION_ISSUER", default_value = defaults::ISSUER)
    )]
    #[serde(default = "SessionConfig::default_issuer")]
    pub session_issuer: String,

    /// Token audience (`aud`).
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "SESSION_AUDIENCE", default_value = defaults::AUDIENCE)
    )]
    #[serde(default = "SessionConfig::default_audience")]
    pub session_audience: String,

    /// Session carrier: `cookie` or `bearer`.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "SESSION_CARRIER", value_enum, default_value_t = SessionCarrier::Cookie)
    )]
    #[serde(default)]
    pub session_carrier: SessionCarrier,

    /// Cookie name used by the cookie carrier.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "SESSION_COOKIE_NAME", default_value = defaults::COOKIE_NAME)
    )]
    #[serde(default = "SessionConfig::default_cookie_name")]
    pub session_cookie_name: String,

    /// Marks the session cookie `Secure`.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(
            long,
            env = "SESSION_COOKIE_SECURE",
            default_value_t = true,
            action = clap::ArgAction::Set
        )
    )]
    #[serde(default = "SessionConfig::default_true")]
    pub session_cookie_secure: bool,

    /// Consults the revoked token store on every request.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(
            long,
            env = "SESSION_CHECK_REVOCATION",
            default_value_t = true,
            action = clap::ArgAction::Set
        )
    )]
    #[serde(default = "SessionConfig::default_true")]
    pub session_check_revocation: bool,
}

impl SessionConfig {
    /// Creates a configuration with default options and the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            session_secret: secret.into(),
            session_ttl_secs: defaults::TTL_SECS,
            session_issuer: defaults::ISSUER.to_owned(),
            session_audience: defaults::AUDIENCE.to_owned(),
            session_carrier: SessionCarrier::default(),
            session_cookie_name: defaults::COOKIE_NAME.to_owned(),
            session_cookie_secure: true,
            session_check_revocation: true,
        }
    }

    /// Sets the carrier.
    pub fn with_carrier(mut self, carrier: SessionCarrier) -> Self {
        self.session_carrier = carrier;
        self
    }

    /// Sets the session lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl_secs = ttl.as_secs();
        self
    }

    /// Enables or disables the revocation lookup.
    pub fn with_revocation_check(mut self, enabled: bool) -> Self {
        self.session_check_revocation = enabled;
        self
    }

    /// Returns the session lifetime.
    #[inline]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Checks the secret length and the remaining fields.
    pub fn validate(&self) -> Result<()> {
        if self.session_secret.len() < defaults::MIN_SECRET_BYTES {
            return Err(Error::config(format!(
                "session secret must be at least {} bytes",
                defaults::MIN_SECRET_BYTES
            )));
        }

        if self.session_ttl_secs == 0 {
            return Err(Error::config("session TTL must be greater than 0"));
        }

        if self.session_issuer.is_empty() || self.session_audience.is_empty() {
            return Err(Error::config("session issuer and audience cannot be empty"));
        }

        let cookie_name_is_valid = !self.session_cookie_name.is_empty()
            && self
                .session_cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !cookie_name_is_valid {
            return Err(Error::config(
                "session cookie name must be non-empty ASCII alphanumerics, '_' or '-'",
            ));
        }

        Ok(())
    }

    fn default_ttl_secs() -> u64 {
        defaults::TTL_SECS
    }

    fn default_issuer() -> String {
        defaults::ISSUER.to_owned()
    }

    fn default_audience() -> String {
        defaults::AUDIENCE.to_owned()
    }

    fn default_cookie_name() -> String {
        defaults::COOKIE_NAME.to_owned()
    }

    fn default_true() -> bool {
        true
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("session_secret", &"<redacted>")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("session_issuer", &self.session_issuer)
            .field("session_audience", &self.session_audience)
            .field("session_carrier", &self.session_carrier)
            .field("session_cookie_name", &self.session_cookie_name)
            .field("session_cookie_secure", &self.session_cookie_secure)
            .field("session_check_revocation", &self.session_check_revocation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::ErrorKind;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        session: SessionConfig,
    }

    #[test]
    fn short_secret_is_rejected() {
        let error = SessionConfig::new("too-short").validate().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
    }

    #[test]
    fn defaults_are_valid() {
        let config = SessionConfig::new("0123456789abcdef0123456789abcdef");
        assert!(config.validate().is_ok());
        assert_eq!(config.session_carrier, SessionCarrier::Cookie);
        assert_eq!(config.ttl(), Duration::from_secs(86_400));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = SessionConfig::new("0123456789abcdef0123456789abcdef");
        let debug = format!("{config:?}");
        assert!(!debug.contains("0123456789abcdef"));
    }

    #[test]
    fn parses_from_arguments() -> anyhow::Result<()> {
        let cli = TestCli::try_parse_from([
            "test",
            "--session-secret",
            "0123456789abcdef0123456789abcdef",
            "--session-carrier",
            "bearer",
            "--session-check-revocation",
            "false",
        ])?;

        assert_eq!(cli.session.session_carrier, SessionCarrier::Bearer);
        assert!(!cli.session.session_check_revocation);
        assert!(cli.session.session_cookie_secure);
        Ok(())
    }
}
