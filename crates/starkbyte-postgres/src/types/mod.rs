//! Shared types for database rows and errors.

mod constraint;

pub use constraint::{ConstraintCategory, ConstraintViolation};
