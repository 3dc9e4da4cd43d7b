//! Signed session tokens.
//!
//! Tokens are HS256 JWTs signed with the process-wide secret from
//! [`SessionConfig`]. Verification fails closed: any structural, signature,
//! audience, issuer or expiry problem yields [`ErrorKind::Invalid`].
//!
//! [`ErrorKind::Invalid`]: crate::ErrorKind::Invalid

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SessionConfig;
use crate::tracing_targets::TRACING_TARGET_SESSION;
use crate::{Error, Result};

/// Claims embedded in every session token.
///
/// | Claim | Field | Description |
/// |-------|-------|-------------|
/// | `iss` | `issued_by` | Token issuer |
/// | `aud` | `audience` | Token audience |
/// | `jti` | `token_id` | Unique token id, the revocation key |
/// | `sub` | `user_id` | User the token was issued to |
/// | `iat` | `issued_at` | Issue time, seconds since the epoch |
/// | `exp` | `expires_at` | Expiry, seconds since the epoch |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "iss")]
    issued_by: String,
    #[serde(rename = "aud")]
    audience: String,

    /// Unique token id.
    #[serde(rename = "jti")]
    pub token_id: Uuid,
    /// User id.
    #[serde(rename = "sub")]
    pub user_id: Uuid,

    #[serde(rename = "iat")]
    issued_at: i64,
    #[serde(rename = "exp")]
    expires_at: i64,
}

impl SessionClaims {
    /// Returns the issue time.
    pub fn issued_at(&self) -> Timestamp {
        Timestamp::from_second(self.issued_at).unwrap_or(Timestamp::UNIX_EPOCH)
    }

    /// Returns the expiry time.
    pub fn expires_at(&self) -> Timestamp {
        Timestamp::from_second(self.expires_at).unwrap_or(Timestamp::UNIX_EPOCH)
    }

    /// Returns `true` once `now` reaches the expiry.
    #[inline]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now.as_second() >= self.expires_at
    }
}

/// Issues and verifies session tokens.
///
/// Cheap to clone; the keys are shared.
#[derive(Clone)]
pub struct SessionCodec {
    inner: Arc<SessionCodecInner>,
}

struct SessionCodecInner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: SessionConfig,
}

impl SessionCodec {
    /// Builds a codec from a validated configuration.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        config.validate()?;

        let secret = config.session_secret.as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.set_audience(&[config.session_audience.as_str()]);
        validation.set_issuer(&[config.session_issuer.as_str()]);
        validation.set_required_spec_claims(&["iss", "aud", "jti", "sub", "iat", "exp"]);

        tracing::debug!(
            target: TRACING_TARGET_SESSION,
            issuer = %config.session_issuer,
            audience = %config.session_audience,
            ttl_secs = config.session_ttl_secs,
            carrier = %config.session_carrier,
            "session codec initialized"
        );

        Ok(Self {
            inner: Arc::new(SessionCodecInner {
                encoding_key: EncodingKey::from_secret(secret),
                decoding_key: DecodingKey::from_secret(secret),
                validation,
                config: config.clone(),
            }),
        })
    }

    /// Returns the configuration the codec was built from.
    #[inline]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Issues a token for `user_id` with the configured lifetime.
    pub fn issue_default(&self, user_id: Uuid) -> Result<(String, SessionClaims)> {
        self.issue(user_id, self.inner.config.ttl())
    }

    /// Issues a token for `user_id` that expires after `ttl`.
    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<(String, SessionClaims)> {
        let issued_at = Timestamp::now().as_second();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = SessionClaims {
            issued_by: self.inner.config.session_issuer.clone(),
            audience: self.inner.config.session_audience.clone(),
            token_id: Uuid::now_v7(),
            user_id,
            issued_at,
            expires_at: issued_at.saturating_add(ttl_secs),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.inner.encoding_key,
        )
        .map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_SESSION,
                error = %e,
                "failed to sign session token"
            );
            Error::internal("session", "Failed to sign session token").with_source(e)
        })?;

        tracing::debug!(
            target: TRACING_TARGET_SESSION,
            token_id = %claims.token_id,
            user_id = %claims.user_id,
            expires_at = claims.expires_at,
            "session token issued"
        );

        Ok((token, claims))
    }

    /// Verifies the signature, audience, issuer and expiry of `token`.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let token_data = decode::<SessionClaims>(
            token,
            &self.inner.decoding_key,
            &self.inner.validation,
        )
        .map_err(|e| {
            tracing::debug!(
                target: TRACING_TARGET_SESSION,
                error = %e,
                "session token rejected"
            );
            Error::invalid("Invalid session token").with_source(e)
        })?;

        let claims = token_data.claims;
        if claims.is_expired_at(Timestamp::now()) {
            tracing::debug!(
                target: TRACING_TARGET_SESSION,
                token_id = %claims.token_id,
                "session token expired"
            );
            return Err(Error::invalid("Invalid session token"));
        }

        Ok(claims)
    }
}

impl fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCodec")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn codec() -> anyhow::Result<SessionCodec> {
        Ok(SessionCodec::from_config(&SessionConfig::new(SECRET))?)
    }

    #[test]
    fn issued_token_verifies() -> anyhow::Result<()> {
        let codec = codec()?;
        let user_id = Uuid::new_v4();

        let (token, issued) = codec.issue(user_id, Duration::from_secs(60))?;
        let verified = codec.verify(&token)?;

        assert_eq!(verified, issued);
        assert_eq!(verified.user_id, user_id);
        Ok(())
    }

    #[test]
    fn token_ids_are_unique() -> anyhow::Result<()> {
        let codec = codec()?;
        let user_id = Uuid::new_v4();

        let (_, first) = codec.issue_default(user_id)?;
        let (_, second) = codec.issue_default(user_id)?;
        assert_ne!(first.token_id, second.token_id);
        Ok(())
    }

    #[test]
    fn expired_token_is_invalid() -> anyhow::Result<()> {
        let codec = codec()?;
        let (token, _) = codec.issue(Uuid::new_v4(), Duration::ZERO)?;

        let error = codec.verify(&token).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Invalid);
        Ok(())
    }

    #[test]
    fn tampered_token_is_invalid() -> anyhow::Result<()> {
        let codec = codec()?;
        let (token, _) = codec.issue(Uuid::new_v4(), Duration::from_secs(60))?;

        let mut tampered = token.clone();
        tampered.push('x');
        assert_eq!(codec.verify(&tampered).unwrap_err().kind(), ErrorKind::Invalid);
        assert_eq!(codec.verify("not.a.token").unwrap_err().kind(), ErrorKind::Invalid);
        assert_eq!(codec.verify("").unwrap_err().kind(), ErrorKind::Invalid);
        Ok(())
    }

    #[test]
    fn token_from_other_secret_is_invalid() -> anyhow::Result<()> {
        let codec = codec()?;
        let other = SessionCodec::from_config(&SessionConfig::new(
            "fedcba9876543210fedcba9876543210",
        ))?;

        let (token, _) = other.issue(Uuid::new_v4(), Duration::from_secs(60))?;
        assert_eq!(codec.verify(&token).unwrap_err().kind(), ErrorKind::Invalid);
        Ok(())
    }

    #[test]
    fn token_for_other_audience_is_invalid() -> anyhow::Result<()> {
        let codec = codec()?;
        let mut config = SessionConfig::new(SECRET);
        config.session_audience = "someone-else".to_owned();
        let other = SessionCodec::from_config(&config)?;

        let (token, _) = other.issue(Uuid::new_v4(), Duration::from_secs(60))?;
        assert_eq!(codec.verify(&token).unwrap_err().kind(), ErrorKind::Invalid);
        Ok(())
    }

    #[test]
    fn short_secret_is_rejected() {
        let error = SessionCodec::from_config(&SessionConfig::new("short")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
    }
}
