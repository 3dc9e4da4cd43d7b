//! Raw password reset tokens and their stored digests.

use rand::RngExt;
use sha2::{Digest, Sha256};

/// Length of the raw token sent by email.
pub const RESET_TOKEN_LENGTH: usize = 48;

/// Generates a random alphanumeric reset token.
pub fn generate_reset_token() -> String {
    let mut rng = rand::rng();
    (0..RESET_TOKEN_LENGTH)
        .map(|_| rng.sample(rand::distr::Alphanumeric) as char)
        .collect()
}

/// Hex SHA-256 of the raw token; only this is stored.
pub fn reset_token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_random_and_alphanumeric() {
        let a = generate_reset_token();
        let b = generate_reset_token();

        assert_eq!(a.len(), RESET_TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn digest_is_stable_hex() {
        let digest = reset_token_digest("token");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, reset_token_digest("token"));
        assert_ne!(digest, reset_token_digest("token2"));
    }
}
