//! Authentication request types.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::service::account::Registration;

/// Self-registration.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Register {
    #[validate(email, length(max = 254))]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
}

impl Register {
    pub fn into_registration(self) -> Registration {
        Registration {
            email: self.email,
            password: self.password,
            full_name: self.full_name,
        }
    }
}

/// Email and password sign-in.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Login {
    #[validate(length(min = 1, max = 254))]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Starts the password reset flow.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPassword {
    #[validate(email, length(max = 254))]
    pub email: String,
}

/// Completes the password reset flow.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPassword {
    #[validate(length(min = 1, max = 256))]
    pub token: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Changes the password of the signed-in user.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    #[validate(length(min = 1, max = 128))]
    pub current_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_validates_fields() {
        let request = Register {
            email: "not-an-email".to_owned(),
            password: "short".to_owned(),
            full_name: String::new(),
        };

        let errors = request.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 3);
    }

    #[test]
    fn register_accepts_valid_input() {
        let request = Register {
            email: "ada@example.com".to_owned(),
            password: "correct horse".to_owned(),
            full_name: "Ada Lovelace".to_owned(),
        };
        assert!(request.validate().is_ok());
    }
}
