#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod audit;
mod error;
pub mod mail;
#[doc(hidden)]
pub mod prelude;

#[cfg(test)]
mod test_support;

pub use audit::{AuditAction, AuditEvent, AuditProvider, AuditService, TracingAuditProvider};
#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use audit::MockAuditProvider;
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use mail::{MailMessage, MailProvider, MailService, TracingMailProvider};
#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use mail::MockMailProvider;
