use std::fmt;
use std::sync::Arc;

use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};

use super::SessionRejection;
use crate::Result;
use crate::service::auth::{PermissionSet, Principal};
use crate::service::security::{SessionCarrier, SessionClaims, SessionCodec};
use crate::service::store::{CredentialStore, RevocationStore};
use crate::tracing_targets::TRACING_TARGET_SESSION;

/// An authenticated request: who is calling, and the token they used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub principal: Principal,
    pub claims: SessionClaims,
}

/// Terminal state of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Authenticated(Box<Session>),
    Rejected(SessionRejection),
}

impl Resolution {
    /// Converts a rejection into an `Unauthenticated` error.
    pub fn into_result(self) -> Result<Session> {
        match self {
            Self::Authenticated(session) => Ok(*session),
            Self::Rejected(rejection) => Err(rejection.into()),
        }
    }

    /// Returns the rejection, if any.
    pub fn rejection(&self) -> Option<SessionRejection> {
        match self {
            Self::Authenticated(_) => None,
            Self::Rejected(rejection) => Some(*rejection),
        }
    }
}

/// Resolves session tokens to principals.
///
/// Store failures are returned as errors; every other outcome is a
/// [`Resolution`].
#[derive(Clone)]
pub struct SessionResolver {
    codec: SessionCodec,
    store: Arc<dyn CredentialStore>,
    revocations: Option<Arc<dyn RevocationStore>>,
}

impl SessionResolver {
    /// Creates a resolver. Pass `revocations` to reject revoked tokens.
    pub fn new(
        codec: SessionCodec,
        store: Arc<dyn CredentialStore>,
        revocations: Option<Arc<dyn RevocationStore>>,
    ) -> Self {
        Self {
            codec,
            store,
            revocations,
        }
    }

    /// Returns the codec used to verify tokens.
    #[inline]
    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    /// Reads the token from the configured carrier only.
    ///
    /// A bearer header is ignored in cookie mode and vice versa.
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        let config = self.codec.config();
        let token = match config.session_carrier {
            SessionCarrier::Cookie => CookieJar::from_headers(headers)
                .get(&config.session_cookie_name)
                .map(|cookie| cookie.value().to_owned()),
            SessionCarrier::Bearer => headers
                .typed_get::<Authorization<Bearer>>()
                .map(|header| header.token().to_owned()),
        };

        token.filter(|token| !token.is_empty())
    }

    /// Resolves the token carried by `headers`.
    pub async fn resolve_headers(&self, headers: &HeaderMap) -> Result<Resolution> {
        let token = self.token_from_headers(headers);
        self.resolve(token.as_deref()).await
    }

    /// Runs the resolution state machine for one request.
    pub async fn resolve(&self, token: Option<&str>) -> Result<Resolution> {
        let Some(token) = token else {
            return Ok(self.reject(SessionRejection::NoCredential, None));
        };

        let Ok(claims) = self.codec.verify(token) else {
            return Ok(self.reject(SessionRejection::BadCredential, None));
        };

        if let Some(revocations) = &self.revocations
            && revocations.is_token_revoked(claims.token_id).await?
        {
            return Ok(self.reject(SessionRejection::Revoked, Some(&claims)));
        }

        let Some((user, role)) = self.store.find_user_with_role(claims.user_id).await? else {
            return Ok(self.reject(SessionRejection::UnknownPrincipal, Some(&claims)));
        };

        let Some(role) = role else {
            return Ok(self.reject(SessionRejection::IncompletePrincipal, Some(&claims)));
        };

        let principal = Principal {
            user_id: user.id,
            email: user.email,
            profile: user.profile,
            role_id: role.id,
            role_name: role.name,
            permissions: PermissionSet::new(role.permissions),
        };

        tracing::debug!(
            target: TRACING_TARGET_SESSION,
            user_id = %principal.user_id,
            token_id = %claims.token_id,
            role = %principal.role_name,
            permissions = principal.permissions.len(),
            "session resolved"
        );

        Ok(Resolution::Authenticated(Box::new(Session { principal, claims })))
    }

    fn reject(&self, rejection: SessionRejection, claims: Option<&SessionClaims>) -> Resolution {
        let user_id = claims.map(|c| c.user_id);
        let token_id = claims.map(|c| c.token_id);

        if rejection.indicates_corruption() {
            tracing::error!(
                target: TRACING_TARGET_SESSION,
                reason = rejection.as_str(),
                user_id = ?user_id,
                token_id = ?token_id,
                "session user references a role that cannot be loaded"
            );
        } else {
            tracing::warn!(
                target: TRACING_TARGET_SESSION,
                reason = rejection.as_str(),
                user_id = ?user_id,
                token_id = ?token_id,
                "session rejected"
            );
        }

        Resolution::Rejected(rejection)
    }
}

impl fmt::Debug for SessionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionResolver")
            .field("codec", &self.codec)
            .field("checks_revocation", &self.revocations.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::header::{AUTHORIZATION, COOKIE};
    use axum::http::HeaderValue;
    use uuid::Uuid;

    use super::*;
    use crate::ErrorKind;
    use crate::service::security::SessionConfig;
    use crate::service::store::{MemoryStore, NewUserRecord, RoleUpdate};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    struct Fixture {
        store: MemoryStore,
        resolver: SessionResolver,
    }

    fn fixture(config: SessionConfig) -> anyhow::Result<Fixture> {
        let store = MemoryStore::new();
        let codec = SessionCodec::from_config(&config)?;
        let revocations: Option<Arc<dyn RevocationStore>> = config
            .session_check_revocation
            .then(|| Arc::new(store.clone()) as Arc<dyn RevocationStore>);
        let resolver = SessionResolver::new(codec, Arc::new(store.clone()), revocations);
        Ok(Fixture { store, resolver })
    }

    async fn user(store: &MemoryStore) -> anyhow::Result<Uuid> {
        let user = store
            .create_user(NewUserRecord {
                email: "ada@example.com".to_owned(),
                password_hash: "hash".to_owned(),
                full_name: "Ada".to_owned(),
            })
            .await?;
        Ok(user.id)
    }

    #[tokio::test]
    async fn missing_token_is_no_credential() -> anyhow::Result<()> {
        let fx = fixture(SessionConfig::new(SECRET))?;
        let resolution = fx.resolver.resolve(None).await?;
        assert_eq!(resolution.rejection(), Some(SessionRejection::NoCredential));

        let error = resolution.into_result().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthenticated);
        Ok(())
    }

    #[tokio::test]
    async fn garbage_and_expired_tokens_are_bad_credentials() -> anyhow::Result<()> {
        let fx = fixture(SessionConfig::new(SECRET))?;
        let user_id = user(&fx.store).await?;

        let resolution = fx.resolver.resolve(Some("garbage")).await?;
        assert_eq!(resolution.rejection(), Some(SessionRejection::BadCredential));

        let (expired, _) = fx.resolver.codec().issue(user_id, Duration::ZERO)?;
        let resolution = fx.resolver.resolve(Some(&expired)).await?;
        assert_eq!(resolution.rejection(), Some(SessionRejection::BadCredential));
        Ok(())
    }

    #[tokio::test]
    async fn revoked_token_is_rejected_only_when_checked() -> anyhow::Result<()> {
        let fx = fixture(SessionConfig::new(SECRET))?;
        let user_id = user(&fx.store).await?;
        let (token, claims) = fx.resolver.codec().issue_default(user_id)?;
        fx.store
            .revoke_token(claims.token_id, user_id, claims.expires_at())
            .await?;

        let resolution = fx.resolver.resolve(Some(&token)).await?;
        assert_eq!(resolution.rejection(), Some(SessionRejection::Revoked));

        let unchecked = SessionResolver::new(
            fx.resolver.codec().clone(),
            Arc::new(fx.store.clone()),
            None,
        );
        let resolution = unchecked.resolve(Some(&token)).await?;
        assert_eq!(resolution.rejection(), None);
        Ok(())
    }

    #[tokio::test]
    async fn deleted_user_is_unknown_principal() -> anyhow::Result<()> {
        let fx = fixture(SessionConfig::new(SECRET))?;
        let user_id = user(&fx.store).await?;
        let (token, _) = fx.resolver.codec().issue_default(user_id)?;
        fx.store.delete_user(user_id).await?;

        let resolution = fx.resolver.resolve(Some(&token)).await?;
        assert_eq!(resolution.rejection(), Some(SessionRejection::UnknownPrincipal));
        Ok(())
    }

    #[tokio::test]
    async fn missing_role_fails_closed() -> anyhow::Result<()> {
        let fx = fixture(SessionConfig::new(SECRET))?;
        let user_id = user(&fx.store).await?;
        let (token, _) = fx.resolver.codec().issue_default(user_id)?;
        assert!(fx.store.break_role_reference(user_id).await);

        let resolution = fx.resolver.resolve(Some(&token)).await?;
        assert_eq!(
            resolution.rejection(),
            Some(SessionRejection::IncompletePrincipal)
        );
        Ok(())
    }

    #[tokio::test]
    async fn valid_token_resolves_principal() -> anyhow::Result<()> {
        let fx = fixture(SessionConfig::new(SECRET))?;
        let user_id = user(&fx.store).await?;
        let (token, claims) = fx.resolver.codec().issue_default(user_id)?;

        let session = fx.resolver.resolve(Some(&token)).await?.into_result()?;
        assert_eq!(session.claims, claims);
        assert_eq!(session.principal.user_id, user_id);
        assert_eq!(session.principal.role_name, "user");
        assert!(session.principal.permissions.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn permission_changes_apply_to_the_same_token() -> anyhow::Result<()> {
        let fx = fixture(SessionConfig::new(SECRET))?;
        let user_id = user(&fx.store).await?;
        let (token, _) = fx.resolver.codec().issue_default(user_id)?;
        fx.store.create_permission("view_users").await?;

        let before = fx.resolver.resolve(Some(&token)).await?.into_result()?;
        assert!(!before.principal.can("view_users"));

        let update = RoleUpdate {
            name: None,
            permissions: Some(vec!["view_users".to_owned()]),
        };
        fx.store
            .update_role(before.principal.role_id, update)
            .await?;

        let after = fx.resolver.resolve(Some(&token)).await?.into_result()?;
        assert!(after.principal.can("view_users"));
        Ok(())
    }

    #[tokio::test]
    async fn carrier_selects_cookie_or_bearer() -> anyhow::Result<()> {
        let cookie_fx = fixture(SessionConfig::new(SECRET))?;
        let bearer_fx =
            fixture(SessionConfig::new(SECRET).with_carrier(SessionCarrier::Bearer))?;

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("starkbyte_session=abc; other=1"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));

        assert_eq!(
            cookie_fx.resolver.token_from_headers(&headers).as_deref(),
            Some("abc")
        );
        assert_eq!(
            bearer_fx.resolver.token_from_headers(&headers).as_deref(),
            Some("xyz")
        );

        headers.remove(COOKIE);
        assert_eq!(cookie_fx.resolver.token_from_headers(&headers), None);
        Ok(())
    }
}
