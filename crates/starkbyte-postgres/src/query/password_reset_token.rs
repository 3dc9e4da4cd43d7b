//! Password reset token repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{NewPasswordResetToken, PasswordResetToken};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for password reset tokens.
///
/// Tokens are addressed by digest; the plaintext never reaches the database.
pub trait PasswordResetTokenRepository {
    /// Stores a new reset token.
    fn create_reset_token(
        &mut self,
        new_token: NewPasswordResetToken,
    ) -> impl Future<Output = PgResult<PasswordResetToken>> + Send;

    /// Finds a token by digest, expired or not.
    fn find_reset_token(
        &mut self,
        token_digest: &str,
    ) -> impl Future<Output = PgResult<Option<PasswordResetToken>>> + Send;

    /// Deletes a token by digest, returning whether this call removed it.
    ///
    /// Exactly one concurrent caller observes `true`.
    fn consume_reset_token(
        &mut self,
        token_digest: &str,
    ) -> impl Future<Output = PgResult<bool>> + Send;

    /// Deletes every outstanding token of a user.
    fn delete_user_reset_tokens(
        &mut self,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<usize>> + Send;

    /// Deletes every expired token.
    fn delete_expired_reset_tokens(
        &mut self,
        now: Timestamp,
    ) -> impl Future<Output = PgResult<usize>> + Send;
}

impl PasswordResetTokenRepository for PgConnection {
    async fn create_reset_token(
        &mut self,
        new_token: NewPasswordResetToken,
    ) -> PgResult<PasswordResetToken> {
        use schema::password_reset_tokens;

        diesel::insert_into(password_reset_tokens::table)
            .values(&new_token)
            .returning(PasswordResetToken::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_reset_token(&mut self, token_digest: &str) -> PgResult<Option<PasswordResetToken>> {
        use schema::password_reset_tokens;

        password_reset_tokens::table
            .find(token_digest)
            .select(PasswordResetToken::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn consume_reset_token(&mut self, token_digest: &str) -> PgResult<bool> {
        use schema::password_reset_tokens;

        let deleted = diesel::delete(password_reset_tokens::table.find(token_digest))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted == 1)
    }

    async fn delete_user_reset_tokens(&mut self, user_id: Uuid) -> PgResult<usize> {
        use schema::password_reset_tokens::{self, dsl};

        diesel::delete(password_reset_tokens::table.filter(dsl::user_id.eq(user_id)))
            .execute(self)
            .await
            .map_err(PgError::from)
    }

    async fn delete_expired_reset_tokens(&mut self, now: Timestamp) -> PgResult<usize> {
        use schema::password_reset_tokens::{self, dsl};

        let now = jiff_diesel::Timestamp::from(now);
        diesel::delete(password_reset_tokens::table.filter(dsl::expires_at.le(now)))
            .execute(self)
            .await
            .map_err(PgError::from)
    }
}
