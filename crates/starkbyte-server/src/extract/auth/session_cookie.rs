//! Session cookie written by login and cleared by logout.

use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::service::security::{SessionCarrier, SessionConfig};

/// Sets or clears the session cookie when the cookie carrier is in use.
///
/// With the bearer carrier it adds nothing to the response.
#[derive(Debug, Clone)]
#[must_use]
pub struct SessionCookie {
    jar: Option<CookieJar>,
}

impl SessionCookie {
    /// Stores `token` in the session cookie.
    pub fn set(config: &SessionConfig, token: String) -> Self {
        if config.session_carrier != SessionCarrier::Cookie {
            return Self { jar: None };
        }

        let cookie = Cookie::build((config.session_cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .secure(config.session_cookie_secure)
            .same_site(SameSite::Lax);

        Self {
            jar: Some(CookieJar::new().add(cookie)),
        }
    }

    /// Expires the session cookie.
    pub fn clear(config: &SessionConfig) -> Self {
        if config.session_carrier != SessionCarrier::Cookie {
            return Self { jar: None };
        }

        let cookie = Cookie::build(config.session_cookie_name.clone()).path("/");
        Self {
            jar: Some(CookieJar::new().remove(cookie)),
        }
    }
}

impl IntoResponseParts for SessionCookie {
    type Error = <CookieJar as IntoResponseParts>::Error;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        match self.jar {
            Some(jar) => jar.into_response_parts(res),
            None => Ok(res),
        }
    }
}
