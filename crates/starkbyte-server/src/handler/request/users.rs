//! User request types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::double_option;
use crate::service::store::ProfileUpdate;

/// Profile changes. Absent fields stay as they are; `null` clears a field.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 32))]
    pub phone: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 200))]
    pub address_line: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 100))]
    pub city: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 20))]
    pub postal_code: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 100))]
    pub country: Option<Option<String>>,
}

impl UpdateUser {
    pub fn into_update(self) -> ProfileUpdate {
        ProfileUpdate {
            full_name: self.full_name,
            phone: self.phone,
            address_line: self.address_line,
            city: self.city,
            postal_code: self.postal_code,
            country: self.country,
        }
    }
}

/// Moves a user to another role.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRole {
    pub role_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_clears_and_absent_keeps() -> anyhow::Result<()> {
        let request: UpdateUser = serde_json::from_value(serde_json::json!({
            "city": null,
            "country": "UK",
        }))?;

        let update = request.into_update();
        assert_eq!(update.city, Some(None));
        assert_eq!(update.country, Some(Some("UK".to_owned())));
        assert_eq!(update.phone, None);
        assert_eq!(update.full_name, None);
        Ok(())
    }
}
