use serde::{Deserialize, Serialize};

use super::{Error, Result};

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    /// Creates a message, rejecting empty or obviously malformed addresses.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self> {
        let message = Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        };

        for address in [&message.from, &message.to] {
            if !address.contains('@') {
                return Err(Error::malformed(format!(
                    "'{address}' is not an email address"
                )));
            }
        }

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_must_contain_at_sign() {
        assert!(MailMessage::new("hub@starkbyte.test", "ada@example.com", "Hi", "Body").is_ok());
        assert!(MailMessage::new("hub@starkbyte.test", "ada", "Hi", "Body").is_err());
        assert!(MailMessage::new("", "ada@example.com", "Hi", "Body").is_err());
    }
}
