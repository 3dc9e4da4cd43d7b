//! Registration, login, logout and password flows.
//!
//! Registration and password reset requests answer the same way whether or
//! not the email is known. Welcome and reset emails go out on a background
//! task and never delay or fail the request.

mod config;
mod reset_token;

use std::fmt;
use std::sync::Arc;

pub use config::{MailConfig, PasswordResetConfig};
use jiff::{SignedDuration, Timestamp};
pub use reset_token::{RESET_TOKEN_LENGTH, generate_reset_token, reset_token_digest};
use serde_json::json;
use starkbyte_service::{AuditAction, AuditEvent, AuditService, MailMessage, MailService};
use uuid::Uuid;

use crate::service::security::{PasswordHasher, SessionClaims, SessionCodec};
use crate::service::store::{
    CredentialStore, DEFAULT_ROLE, NewUserRecord, ResetTokenRecord, RevocationStore, RoleRecord,
    UserRecord,
};
use crate::tracing_targets::{TRACING_TARGET_AUTHENTICATION, TRACING_TARGET_CLEANUP};
use crate::{Error, ErrorKind, Result};

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length in characters.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Checks the password length bounds.
pub fn validate_password(password: &str) -> Result<()> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(Error::invalid(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(Error::invalid(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Trims and lowercases an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Self-registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// A freshly issued session token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

/// Counts reported by [`AccountService::purge_expired_tokens`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub reset_tokens: usize,
    pub revocations: usize,
}

/// Account lifecycle operations.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn CredentialStore>,
    revocations: Arc<dyn RevocationStore>,
    hasher: PasswordHasher,
    codec: SessionCodec,
    audit: AuditService,
    mail: MailService,
    reset: PasswordResetConfig,
    mail_config: MailConfig,
}

impl AccountService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        revocations: Arc<dyn RevocationStore>,
        hasher: PasswordHasher,
        codec: SessionCodec,
        audit: AuditService,
        mail: MailService,
        reset: PasswordResetConfig,
        mail_config: MailConfig,
    ) -> Self {
        Self {
            store,
            revocations,
            hasher,
            codec,
            audit,
            mail,
            reset,
            mail_config,
        }
    }

    /// Creates the [`DEFAULT_ROLE`] if it is missing.
    pub async fn ensure_default_role(&self) -> Result<RoleRecord> {
        if let Some(role) = self.store.find_role_by_name(DEFAULT_ROLE).await? {
            return Ok(role);
        }

        match self.store.create_role(DEFAULT_ROLE, &[]).await {
            Ok(role) => {
                tracing::warn!(
                    target: TRACING_TARGET_AUTHENTICATION,
                    role = DEFAULT_ROLE,
                    "default role was missing and has been created"
                );
                Ok(role)
            }
            // Lost a race with another instance.
            Err(e) if e.kind() == ErrorKind::Conflict => self
                .store
                .find_role_by_name(DEFAULT_ROLE)
                .await?
                .ok_or_else(|| Error::internal("account", "Default role is missing")),
            Err(e) => Err(e),
        }
    }

    /// Registers a user with the default role.
    ///
    /// A taken email succeeds the same way as a fresh one, without email.
    pub async fn register(&self, registration: Registration) -> Result<()> {
        validate_password(&registration.password)?;
        let email = normalize_email(&registration.email);
        let full_name = registration.full_name.trim().to_owned();
        if full_name.is_empty() {
            return Err(Error::invalid("Full name cannot be empty"));
        }

        let password_hash = self.hasher.hash_password(&registration.password)?;
        let new_user = NewUserRecord {
            email,
            password_hash,
            full_name,
        };

        let user = match self.store.create_user(new_user).await {
            Ok(user) => user,
            Err(e) if e.kind() == ErrorKind::Conflict => {
                tracing::info!(
                    target: TRACING_TARGET_AUTHENTICATION,
                    "registration for an existing email ignored"
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            target: TRACING_TARGET_AUTHENTICATION,
            user_id = %user.id,
            "user registered"
        );
        self.record(
            AuditEvent::new(AuditAction::UserRegistered)
                .with_actor(user.id)
                .with_metadata(json!({ "userId": user.id })),
        );
        self.send_mail(
            &user.email,
            "Welcome to Stark Byte Hub",
            format!(
                "Hi {},\n\nyour Stark Byte Hub account is ready.\n",
                user.profile.full_name
            ),
        );

        Ok(())
    }

    /// Verifies credentials and issues a session token.
    ///
    /// Unknown emails and wrong passwords fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedSession> {
        let email = normalize_email(email);
        let user = self.store.find_user_by_email(&email).await?;

        let password_valid = match &user {
            Some(user) => self.hasher.verify_password(password, &user.password_hash),
            None => self.hasher.verify_dummy_password(password),
        };

        let user = match user {
            Some(user) if password_valid => user,
            user => {
                tracing::warn!(
                    target: TRACING_TARGET_AUTHENTICATION,
                    user_exists = user.is_some(),
                    "login failed"
                );
                return Err(Error::unauthenticated("Invalid email or password"));
            }
        };

        let (token, claims) = self.codec.issue_default(user.id)?;
        tracing::info!(
            target: TRACING_TARGET_AUTHENTICATION,
            user_id = %user.id,
            token_id = %claims.token_id,
            "login successful"
        );

        Ok(IssuedSession { token, claims })
    }

    /// Revokes the token described by `claims`.
    pub async fn logout(&self, claims: &SessionClaims) -> Result<()> {
        self.revocations
            .revoke_token(claims.token_id, claims.user_id, claims.expires_at())
            .await?;

        tracing::info!(
            target: TRACING_TARGET_AUTHENTICATION,
            user_id = %claims.user_id,
            token_id = %claims.token_id,
            "session revoked"
        );
        self.record(
            AuditEvent::new(AuditAction::SessionRevoked)
                .with_actor(claims.user_id)
                .with_metadata(json!({ "tokenId": claims.token_id })),
        );

        Ok(())
    }

    /// Replaces the password after checking the current one.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        validate_password(new_password)?;
        let user = self.find_user(user_id).await?;

        if !self
            .hasher
            .verify_password(current_password, &user.password_hash)
        {
            tracing::warn!(
                target: TRACING_TARGET_AUTHENTICATION,
                user_id = %user_id,
                "password change with wrong current password"
            );
            return Err(Error::invalid("Current password is incorrect"));
        }

        let password_hash = self.hasher.hash_password(new_password)?;
        if !self
            .store
            .update_user_credential(user_id, password_hash)
            .await?
        {
            return Err(Error::not_found("User not found"));
        }

        tracing::info!(
            target: TRACING_TARGET_AUTHENTICATION,
            user_id = %user_id,
            "password changed"
        );
        self.record(
            AuditEvent::new(AuditAction::PasswordChanged)
                .with_actor(user_id)
                .with_metadata(json!({ "userId": user_id })),
        );

        Ok(())
    }

    /// Emails a reset link if `email` belongs to a user.
    ///
    /// Returns `Ok(())` either way. Failures after the lookup are logged and
    /// swallowed, since they only happen for known accounts.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            tracing::info!(
                target: TRACING_TARGET_AUTHENTICATION,
                "password reset requested for an unknown email"
            );
            return Ok(());
        };

        if let Err(e) = self.issue_reset_token(&user).await {
            tracing::error!(
                target: TRACING_TARGET_AUTHENTICATION,
                user_id = %user.id,
                error = %e,
                "failed to issue password reset token"
            );
        }

        Ok(())
    }

    async fn issue_reset_token(&self, user: &UserRecord) -> Result<()> {
        let token = generate_reset_token();
        let link = self.mail_config.reset_link(&token)?;
        let created_at = Timestamp::now();
        let ttl = SignedDuration::try_from(self.reset.ttl())
            .map_err(|e| Error::config("reset token TTL is out of range").with_source(e))?;
        let expires_at = created_at
            .checked_add(ttl)
            .map_err(|e| Error::config("reset token TTL is out of range").with_source(e))?;

        self.store
            .create_reset_token(ResetTokenRecord {
                token_digest: reset_token_digest(&token),
                user_id: user.id,
                created_at,
                expires_at,
            })
            .await?;

        tracing::info!(
            target: TRACING_TARGET_AUTHENTICATION,
            user_id = %user.id,
            expires_at = %expires_at,
            "password reset token issued"
        );
        self.record(
            AuditEvent::new(AuditAction::PasswordResetRequested)
                .with_metadata(json!({ "userId": user.id })),
        );
        self.send_mail(
            &user.email,
            "Reset your Stark Byte Hub password",
            format!(
                "Hi {},\n\nopen this link to choose a new password:\n{link}\n\n\
                 The link expires in {} minutes. If you did not ask for it, ignore this email.\n",
                user.profile.full_name,
                self.reset.reset_token_ttl_secs / 60,
            ),
        );

        Ok(())
    }

    /// Sets a new password using a reset token. The token works once.
    ///
    /// Unknown, consumed and expired tokens all fail with the same `Invalid`.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        validate_password(new_password)?;
        let digest = reset_token_digest(token);
        let invalid = || Error::invalid("Reset token is invalid or has expired");

        let Some(record) = self.store.find_reset_token(&digest).await? else {
            tracing::warn!(
                target: TRACING_TARGET_AUTHENTICATION,
                "unknown password reset token"
            );
            return Err(invalid());
        };

        if record.is_expired_at(Timestamp::now()) {
            self.store.consume_reset_token(&digest).await?;
            tracing::warn!(
                target: TRACING_TARGET_AUTHENTICATION,
                user_id = %record.user_id,
                "expired password reset token"
            );
            return Err(invalid());
        }

        let password_hash = self.hasher.hash_password(new_password)?;

        // Only one concurrent caller wins the delete.
        if self
            .store
            .redeem_reset_token(&digest, password_hash)
            .await?
            .is_none()
        {
            return Err(invalid());
        }

        tracing::info!(
            target: TRACING_TARGET_AUTHENTICATION,
            user_id = %record.user_id,
            "password reset"
        );
        self.record(
            AuditEvent::new(AuditAction::PasswordReset)
                .with_actor(record.user_id)
                .with_metadata(json!({ "userId": record.user_id })),
        );

        Ok(())
    }

    /// Deletes expired reset tokens and revocations.
    pub async fn purge_expired_tokens(&self, now: Timestamp) -> Result<PurgeReport> {
        let report = PurgeReport {
            reset_tokens: self.store.delete_expired_reset_tokens(now).await?,
            revocations: self.revocations.delete_expired_revocations(now).await?,
        };

        tracing::debug!(
            target: TRACING_TARGET_CLEANUP,
            reset_tokens = report.reset_tokens,
            revocations = report.revocations,
            "expired tokens purged"
        );

        Ok(report)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<UserRecord> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))
    }

    fn record(&self, event: AuditEvent) {
        drop(self.audit.record(event));
    }

    fn send_mail(&self, to: &str, subject: &str, body: String) {
        match MailMessage::new(&self.mail_config.mail_from, to, subject, body) {
            Ok(message) => drop(self.mail.send(message)),
            Err(e) => tracing::error!(
                target: TRACING_TARGET_AUTHENTICATION,
                error = %e,
                "failed to build email"
            ),
        }
    }
}

impl fmt::Debug for AccountService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountService")
            .field("codec", &self.codec)
            .field("reset", &self.reset)
            .field("mail_config", &self.mail_config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use starkbyte_service::{MockAuditProvider, MockMailProvider};

    use super::*;
    use crate::service::security::SessionConfig;
    use crate::service::store::MemoryStore;

    const WAIT: Duration = Duration::from_secs(2);

    struct Fixture {
        store: MemoryStore,
        mail: MockMailProvider,
        audit: MockAuditProvider,
        accounts: AccountService,
    }

    fn fixture() -> anyhow::Result<Fixture> {
        let store = MemoryStore::new();
        let mail = MockMailProvider::new();
        let audit = MockAuditProvider::new();
        let codec = SessionCodec::from_config(&SessionConfig::new(
            "0123456789abcdef0123456789abcdef",
        ))?;

        let accounts = AccountService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            PasswordHasher::with_cost(1024, 1)?,
            codec,
            AuditService::new(audit.clone()),
            MailService::new(mail.clone()),
            PasswordResetConfig::default(),
            MailConfig::default(),
        );

        Ok(Fixture {
            store,
            mail,
            audit,
            accounts,
        })
    }

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.to_owned(),
            password: "correct horse".to_owned(),
            full_name: "Ada Lovelace".to_owned(),
        }
    }

    /// Pulls the raw token out of the reset email body.
    fn token_from(message: &MailMessage) -> anyhow::Result<String> {
        let start = message
            .body
            .find("token=")
            .ok_or_else(|| anyhow::anyhow!("no token in body"))?;
        Ok(message.body[start + 6..]
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect())
    }

    async fn requested_token(fx: &Fixture, email: &str) -> anyhow::Result<String> {
        fx.accounts.request_password_reset(email).await?;
        let outbox = fx.mail.wait_for(2, WAIT).await;
        let message = outbox
            .iter()
            .find(|m| m.subject.contains("Reset"))
            .ok_or_else(|| anyhow::anyhow!("no reset email"))?;
        token_from(message)
    }

    #[tokio::test]
    async fn register_then_login() -> anyhow::Result<()> {
        let fx = fixture()?;
        fx.accounts.register(registration(" Ada@Example.com ")).await?;

        let session = fx
            .accounts
            .login("ada@example.com", "correct horse")
            .await?;
        let user = fx
            .store
            .find_user_by_email("ada@example.com")
            .await?
            .ok_or_else(|| anyhow::anyhow!("user missing"))?;
        assert_eq!(session.claims.user_id, user.id);

        let role = fx
            .store
            .find_role(user.role_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("role missing"))?;
        assert_eq!(role.name, DEFAULT_ROLE);

        let outbox = fx.mail.wait_for(1, WAIT).await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "ada@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_registration_looks_successful() -> anyhow::Result<()> {
        let fx = fixture()?;
        fx.accounts.register(registration("ada@example.com")).await?;
        fx.accounts.register(registration("ADA@example.com")).await?;

        assert_eq!(fx.store.list_users(10, 0).await?.len(), 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fx.mail.outbox().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn short_password_is_invalid() -> anyhow::Result<()> {
        let fx = fixture()?;
        let mut request = registration("ada@example.com");
        request.password = "short".to_owned();

        let error = fx.accounts.register(request).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Invalid);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_fail_alike() -> anyhow::Result<()> {
        let fx = fixture()?;
        fx.accounts.register(registration("ada@example.com")).await?;

        let wrong = fx
            .accounts
            .login("ada@example.com", "wrong password")
            .await
            .unwrap_err();
        let unknown = fx
            .accounts
            .login("nobody@example.com", "correct horse")
            .await
            .unwrap_err();

        assert_eq!(wrong.kind(), ErrorKind::Unauthenticated);
        assert_eq!(unknown.kind(), ErrorKind::Unauthenticated);
        assert_eq!(wrong.message(), unknown.message());
        Ok(())
    }

    #[tokio::test]
    async fn logout_revokes_the_token() -> anyhow::Result<()> {
        let fx = fixture()?;
        fx.accounts.register(registration("ada@example.com")).await?;
        let session = fx
            .accounts
            .login("ada@example.com", "correct horse")
            .await?;

        fx.accounts.logout(&session.claims).await?;
        assert!(fx.store.is_token_revoked(session.claims.token_id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn change_password_requires_current_password() -> anyhow::Result<()> {
        let fx = fixture()?;
        fx.accounts.register(registration("ada@example.com")).await?;
        let session = fx
            .accounts
            .login("ada@example.com", "correct horse")
            .await?;
        let user_id = session.claims.user_id;

        let error = fx
            .accounts
            .change_password(user_id, "not it", "battery staple")
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Invalid);

        fx.accounts
            .change_password(user_id, "correct horse", "battery staple")
            .await?;
        fx.accounts
            .login("ada@example.com", "battery staple")
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn reset_request_for_unknown_email_succeeds_silently() -> anyhow::Result<()> {
        let fx = fixture()?;
        fx.accounts
            .request_password_reset("nobody@example.com")
            .await?;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(fx.mail.outbox().await.is_empty());
        assert_eq!(fx.store.reset_token_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn reset_token_works_once() -> anyhow::Result<()> {
        let fx = fixture()?;
        fx.accounts.register(registration("ada@example.com")).await?;
        let token = requested_token(&fx, "ada@example.com").await?;
        assert_eq!(token.len(), RESET_TOKEN_LENGTH);

        fx.accounts.reset_password(&token, "battery staple").await?;
        fx.accounts
            .login("ada@example.com", "battery staple")
            .await?;

        let error = fx
            .accounts
            .reset_password(&token, "another password")
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Invalid);
        assert!(
            fx.store
                .find_reset_token(&reset_token_digest(&token))
                .await?
                .is_none()
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_reset_keeps_the_token() -> anyhow::Result<()> {
        let fx = fixture()?;
        fx.accounts.register(registration("ada@example.com")).await?;
        let token = requested_token(&fx, "ada@example.com").await?;

        fx.store.fail_credential_writes(true).await;
        let error = fx
            .accounts
            .reset_password(&token, "battery staple")
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Internal);
        assert!(
            fx.store
                .find_reset_token(&reset_token_digest(&token))
                .await?
                .is_some()
        );
        fx.accounts.login("ada@example.com", "correct horse").await?;

        fx.store.fail_credential_writes(false).await;
        fx.accounts.reset_password(&token, "battery staple").await?;
        fx.accounts
            .login("ada@example.com", "battery staple")
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn expired_token_fails_like_unknown_token() -> anyhow::Result<()> {
        let fx = fixture()?;
        fx.accounts.register(registration("ada@example.com")).await?;
        let user = fx
            .store
            .find_user_by_email("ada@example.com")
            .await?
            .ok_or_else(|| anyhow::anyhow!("user missing"))?;

        let now = Timestamp::now();
        fx.store
            .create_reset_token(ResetTokenRecord {
                token_digest: reset_token_digest("expired-token"),
                user_id: user.id,
                created_at: now - SignedDuration::from_hours(2),
                expires_at: now - SignedDuration::from_secs(1),
            })
            .await?;

        let expired = fx
            .accounts
            .reset_password("expired-token", "battery staple")
            .await
            .unwrap_err();
        let unknown = fx
            .accounts
            .reset_password("never-issued", "battery staple")
            .await
            .unwrap_err();

        assert_eq!(expired.kind(), ErrorKind::Invalid);
        assert_eq!(unknown.kind(), ErrorKind::Invalid);
        assert_eq!(expired.message(), unknown.message());
        assert_eq!(fx.store.reset_token_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn purge_removes_only_expired_entries() -> anyhow::Result<()> {
        let fx = fixture()?;
        fx.accounts.register(registration("ada@example.com")).await?;
        requested_token(&fx, "ada@example.com").await?;

        let session = fx
            .accounts
            .login("ada@example.com", "correct horse")
            .await?;
        fx.accounts.logout(&session.claims).await?;

        let report = fx.accounts.purge_expired_tokens(Timestamp::now()).await?;
        assert_eq!(report, PurgeReport::default());

        let later = Timestamp::now() + SignedDuration::from_hours(48);
        let report = fx.accounts.purge_expired_tokens(later).await?;
        assert_eq!(report.reset_tokens, 1);
        assert_eq!(report.revocations, 1);
        Ok(())
    }

    #[tokio::test]
    async fn account_mutations_are_audited() -> anyhow::Result<()> {
        let fx = fixture()?;
        fx.accounts.register(registration("ada@example.com")).await?;

        let events = fx.audit.wait_for(1, WAIT).await;
        assert_eq!(events[0].action, AuditAction::UserRegistered);
        Ok(())
    }

    #[tokio::test]
    async fn default_role_is_recreated_when_missing() -> anyhow::Result<()> {
        let fx = fixture()?;
        let role = fx
            .store
            .find_role_by_name(DEFAULT_ROLE)
            .await?
            .ok_or_else(|| anyhow::anyhow!("role missing"))?;
        fx.store.delete_role_if_unused(role.id).await?;

        let recreated = fx.accounts.ensure_default_role().await?;
        assert_eq!(recreated.name, DEFAULT_ROLE);
        assert_ne!(recreated.id, role.id);
        assert_eq!(fx.accounts.ensure_default_role().await?.id, recreated.id);
        Ok(())
    }
}
