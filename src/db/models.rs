use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `users` directory. `phone` keeps whatever formatting it was stored with.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i32,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
}

/// Partial update of a directory row. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl UserUpdate {
    /// Builds an update from raw optional inputs, treating blank strings as absent.
    pub fn from_inputs(
        first_name: Option<String>,
        last_name: Option<String>,
        phone: Option<String>,
    ) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            first_name: present(first_name),
            last_name: present(last_name),
            phone: present(phone),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.phone.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_inputs_count_as_absent() {
        let update = UserUpdate::from_inputs(Some("  ".into()), None, Some(String::new()));
        assert!(update.is_empty());

        let update = UserUpdate::from_inputs(None, Some("Shevchenko".into()), None);
        assert!(!update.is_empty());
        assert_eq!(update.last_name.as_deref(), Some("Shevchenko"));
    }

    #[test]
    fn record_serializes_camel_case_without_timestamp() {
        let record = UserRecord {
            id: 7,
            phone: "+380 99 123-45-67".into(),
            first_name: "Ivan".into(),
            last_name: "Petrenko".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "phone": "+380 99 123-45-67",
                "firstName": "Ivan",
                "lastName": "Petrenko",
            })
        );
    }
}
