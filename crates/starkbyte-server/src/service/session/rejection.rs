use crate::Error;

/// Why a request could not be authenticated.
///
/// Every variant surfaces to the caller as [`ErrorKind::Unauthenticated`];
/// the variant itself is kept for logs and tests.
///
/// [`ErrorKind::Unauthenticated`]: crate::ErrorKind::Unauthenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[derive(strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SessionRejection {
    /// No token on the configured carrier.
    #[error("no session credential was presented")]
    NoCredential,
    /// Token is malformed, unsigned, tampered with or expired.
    #[error("session credential is invalid")]
    BadCredential,
    /// Token verified but was revoked.
    #[error("session credential was revoked")]
    Revoked,
    /// Token names a user that no longer exists.
    #[error("session refers to an unknown user")]
    UnknownPrincipal,
    /// User exists but their role could not be loaded.
    #[error("session user has no resolvable role")]
    IncompletePrincipal,
}

impl SessionRejection {
    /// Returns a stable snake_case name for logging.
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Returns `true` for rejections that point at inconsistent stored data
    /// rather than at the caller.
    #[inline]
    pub fn indicates_corruption(self) -> bool {
        matches!(self, Self::IncompletePrincipal)
    }
}

impl From<SessionRejection> for Error {
    fn from(rejection: SessionRejection) -> Self {
        let message = match rejection {
            SessionRejection::NoCredential => "Authentication required",
            SessionRejection::BadCredential | SessionRejection::Revoked => {
                "Session is invalid or has expired"
            }
            SessionRejection::UnknownPrincipal | SessionRejection::IncompletePrincipal => {
                "Session is no longer valid"
            }
        };

        Error::unauthenticated(message).with_source(rejection)
    }
}
