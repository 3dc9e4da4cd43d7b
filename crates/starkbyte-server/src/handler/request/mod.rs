//! Request types for HTTP handlers.

mod authentications;
mod pagination;
mod paths;
mod roles;
mod users;

pub use authentications::*;
pub use pagination::*;
pub use paths::*;
pub use roles::*;
pub use users::*;

use serde::{Deserialize, Deserializer};

/// Tells an absent field (`None`) apart from an explicit `null` (`Some(None)`).
///
/// Use together with `#[serde(default)]`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
