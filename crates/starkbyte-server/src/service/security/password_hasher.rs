//! Password hashing and verification using Argon2id.

use std::sync::Arc;

use argon2::password_hash::Error as ArgonError;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version};
use rand::RngExt;
use rand::distr::Alphanumeric;
use rand::TryRng;
use rand::rngs::SysRng;

use crate::tracing_targets::TRACING_TARGET_HASHER;
use crate::{Error, Result};

/// Argon2id password hasher.
///
/// Hashes are self-describing PHC strings, so hashes produced with different
/// cost parameters keep verifying after the parameters change.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Hash of a random password, verified against for unknown accounts.
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    /// Creates a hasher with the default (OWASP recommended) Argon2id parameters.
    pub fn new() -> Result<Self> {
        Self::from_argon2(Argon2::default())
    }

    /// Creates a hasher with explicit memory (KiB) and iteration costs.
    ///
    /// Lower costs are only meant for tests.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, 1, None).map_err(|e| {
            Error::config(format!("invalid argon2 parameters: {e}"))
        })?;

        Self::from_argon2(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn from_argon2(argon2: Argon2<'static>) -> Result<Self> {
        let mut hasher = Self {
            argon2,
            dummy_hash: Arc::from(""),
        };

        let mut rng = rand::rng();
        let dummy_password: String = (0..32)
            .map(|_| rng.sample(Alphanumeric) as char)
            .collect();
        hasher.dummy_hash = hasher.hash_password(&dummy_password)?.into();

        Ok(hasher)
    }

    /// Hashes `password` with a fresh random salt.
    ///
    /// Two calls with the same input produce different outputs.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let mut salt = [0u8; 16];
        SysRng.try_fill_bytes(&mut salt).map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_HASHER,
                error = %e,
                "failed to generate salt"
            );
            Error::internal("hasher", "Salt generation failed")
        })?;

        let password_hash = self
            .argon2
            .hash_password_with_salt(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(
                    target: TRACING_TARGET_HASHER,
                    error = %e,
                    "password hashing failed"
                );
                Error::internal("hasher", "Password hashing failed")
            })?;

        Ok(password_hash.to_string())
    }

    /// Verifies `password` against a stored PHC hash.
    ///
    /// Returns `false` on mismatch and for unparseable hashes; never errors.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(stored_hash) {
            Ok(parsed_hash) => parsed_hash,
            Err(e) => {
                tracing::warn!(
                    target: TRACING_TARGET_HASHER,
                    error = %e,
                    "stored password hash is malformed"
                );
                return false;
            }
        };

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => true,
            Err(ArgonError::PasswordInvalid) => {
                tracing::debug!(target: TRACING_TARGET_HASHER, "password mismatch");
                false
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_HASHER,
                    error = %e,
                    "password verification failed"
                );
                false
            }
        }
    }

    /// Verifies against a precomputed hash so that unknown accounts take
    /// as long to reject as wrong passwords. Always returns `false`.
    pub fn verify_dummy_password(&self, password: &str) -> bool {
        let _ = self.verify_password(password, &self.dummy_hash);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> anyhow::Result<PasswordHasher> {
        Ok(PasswordHasher::with_cost(1024, 1)?)
    }

    #[test]
    fn hash_and_verify_password() -> anyhow::Result<()> {
        let hasher = hasher()?;
        let hash = hasher.hash_password("secure_password_123")?;

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("secure_password_123", &hash));
        assert!(!hasher.verify_password("wrong_password", &hash));
        Ok(())
    }

    #[test]
    fn hash_produces_unique_salts() -> anyhow::Result<()> {
        let hasher = hasher()?;
        let hash1 = hasher.hash_password("test_password")?;
        let hash2 = hasher.hash_password("test_password")?;

        assert_ne!(hash1, hash2);
        assert!(hasher.verify_password("test_password", &hash1));
        assert!(hasher.verify_password("test_password", &hash2));
        Ok(())
    }

    #[test]
    fn malformed_hash_does_not_verify() -> anyhow::Result<()> {
        let hasher = hasher()?;
        assert!(!hasher.verify_password("test_password", "invalid_hash_format"));
        Ok(())
    }

    #[test]
    fn hashes_verify_across_cost_settings() -> anyhow::Result<()> {
        let cheap = hasher()?;
        let other = PasswordHasher::with_cost(2048, 2)?;
        let hash = cheap.hash_password("portable")?;

        assert!(other.verify_password("portable", &hash));
        Ok(())
    }

    #[test]
    fn dummy_verification_always_fails() -> anyhow::Result<()> {
        let hasher = hasher()?;
        assert!(!hasher.verify_dummy_password("anything"));
        Ok(())
    }

    #[test]
    fn dummy_hash_is_fixed_and_costs_like_real_hashes() -> anyhow::Result<()> {
        let hasher = hasher()?;
        let before = hasher.dummy_hash.clone();
        hasher.verify_dummy_password("anything");
        assert!(Arc::ptr_eq(&before, &hasher.dummy_hash));

        // Same algorithm, version and cost: `$argon2id$v=19$m=..,t=..,p=..`.
        let real = hasher.hash_password("real_password")?;
        let header = |phc: &str| phc.splitn(5, '$').take(4).collect::<Vec<_>>().join("$");
        assert_eq!(header(&hasher.dummy_hash), header(&real));
        assert!(header(&real).contains("m=1024,t=1"));
        Ok(())
    }
}
