//! Revoked session token repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;
use uuid::Uuid;

use crate::model::NewRevokedToken;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for the session token revocation list.
pub trait RevokedTokenRepository {
    /// Records a revocation. Revoking the same token twice is a no-op.
    fn revoke_token(
        &mut self,
        new_token: NewRevokedToken,
    ) -> impl Future<Output = PgResult<()>> + Send;

    /// Returns whether the token id is on the revocation list.
    fn is_token_revoked(&mut self, token_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;

    /// Removes revocations whose tokens have expired anyway.
    fn delete_expired_revocations(
        &mut self,
        now: Timestamp,
    ) -> impl Future<Output = PgResult<usize>> + Send;
}

impl RevokedTokenRepository for PgConnection {
    async fn revoke_token(&mut self, new_token: NewRevokedToken) -> PgResult<()> {
        use schema::revoked_tokens;

        diesel::insert_into(revoked_tokens::table)
            .values(&new_token)
            .on_conflict_do_nothing()
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }

    async fn is_token_revoked(&mut self, token_id: Uuid) -> PgResult<bool> {
        use schema::revoked_tokens;

        diesel::select(diesel::dsl::exists(revoked_tokens::table.find(token_id)))
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn delete_expired_revocations(&mut self, now: Timestamp) -> PgResult<usize> {
        use schema::revoked_tokens::{self, dsl};

        let now = jiff_diesel::Timestamp::from(now);
        diesel::delete(revoked_tokens::table.filter(dsl::expires_at.le(now)))
            .execute(self)
            .await
            .map_err(PgError::from)
    }
}
