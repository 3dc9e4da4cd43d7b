//! Password reset and outbound mail configuration.

use std::time::Duration;

#[cfg(any(test, feature = "config"))]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

mod defaults {
    /// One hour.
    pub const RESET_TOKEN_TTL_SECS: u64 = 60 * 60;
    pub const MAIL_FROM: &str = "no-reply@starkbyte.test";
    pub const APP_URL: &str = "http://localhost:3000";
}

/// Password reset token settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(any(test, feature = "config"), derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct PasswordResetConfig {
    /// Lifetime of a password reset token in seconds.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "RESET_TOKEN_TTL_SECS", default_value_t = defaults::RESET_TOKEN_TTL_SECS)
    )]
    pub reset_token_ttl_secs: u64,
}

impl PasswordResetConfig {
    /// Returns the token lifetime.
    #[inline]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.reset_token_ttl_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reset_token_ttl_secs == 0 {
            return Err(Error::config("reset token TTL must be greater than 0"));
        }
        Ok(())
    }
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self {
            reset_token_ttl_secs: defaults::RESET_TOKEN_TTL_SECS,
        }
    }
}

/// Sender address and the public URL used in email bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(any(test, feature = "config"), derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct MailConfig {
    /// Sender address of outbound email.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "MAIL_FROM", default_value = defaults::MAIL_FROM)
    )]
    pub mail_from: String,

    /// Public base URL of the application, used for reset links.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "APP_URL", default_value = defaults::APP_URL)
    )]
    pub app_url: String,
}

impl MailConfig {
    /// Parses the application URL.
    pub fn app_url(&self) -> Result<Url> {
        Url::parse(&self.app_url)
            .map_err(|e| Error::config(format!("invalid application URL: {e}")).with_source(e))
    }

    /// Builds the reset link carrying `token`.
    pub fn reset_link(&self, token: &str) -> Result<Url> {
        let mut url = self
            .app_url()?
            .join("reset-password")
            .map_err(|e| Error::config(format!("invalid application URL: {e}")).with_source(e))?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mail_from.contains('@') {
            return Err(Error::config("mail sender must be an email address"));
        }
        self.app_url().map(drop)
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            mail_from: defaults::MAIL_FROM.to_owned(),
            app_url: defaults::APP_URL.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn reset_link_carries_token() -> anyhow::Result<()> {
        let config = MailConfig {
            app_url: "https://hub.starkbyte.test/app/".to_owned(),
            ..Default::default()
        };

        let link = config.reset_link("abc123")?;
        assert_eq!(
            link.as_str(),
            "https://hub.starkbyte.test/app/reset-password?token=abc123"
        );
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = MailConfig {
            app_url: "not a url".to_owned(),
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Config);

        let config = PasswordResetConfig {
            reset_token_ttl_secs: 0,
        };
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Config);
        assert!(PasswordResetConfig::default().validate().is_ok());
        assert!(MailConfig::default().validate().is_ok());
    }
}
