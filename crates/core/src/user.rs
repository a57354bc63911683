//! Shopper identity returned by the login endpoint.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Email;

/// The logged-in shopper.
///
/// The backend returns its full user document on login; only the public
/// profile fields are kept; everything else (including the password hash)
/// is dropped during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub email: Email,
    /// Account creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "date_only")]
    pub date_of_birth: Option<NaiveDate>,
}

impl User {
    /// Human-readable join date, e.g. `"12 March 2025"`.
    #[must_use]
    pub fn member_since(&self) -> Option<String> {
        self.joined.map(|joined| joined.format("%-d %B %Y").to_string())
    }
}

/// Dates of birth arrive either as `YYYY-MM-DD` or as a full timestamp.
mod date_only {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => s.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(d)? else {
            return Ok(None);
        };
        if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            return Ok(Some(date));
        }
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| Some(ts.with_timezone(&Utc).date_naive()))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_login_payload_drops_private_fields() {
        let json = r#"{
            "_id": "u1",
            "name": "Asha",
            "email": "asha@example.com",
            "password": "$2a$10$hash",
            "phone": "9876543210",
            "dateOfBirth": "1999-04-01T00:00:00.000Z",
            "joined": "2025-03-12T10:00:00.000Z",
            "login_date": "2025-06-01T10:00:00.000Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(user.email.as_str(), "asha@example.com");
        assert_eq!(user.date_of_birth, NaiveDate::from_ymd_opt(1999, 4, 1));
        assert_eq!(user.member_since().as_deref(), Some("12 March 2025"));

        let stored = serde_json::to_string(&user).unwrap();
        assert!(!stored.contains("password"));
        assert!(stored.contains("\"dateOfBirth\":\"1999-04-01\""));
    }

    #[test]
    fn test_minimal_user() {
        let user: User = serde_json::from_str(r#"{"name":"Ravi","email":"ravi@example.com"}"#).unwrap();
        assert_eq!(user.joined, None);
        assert_eq!(user.member_since(), None);
    }

    #[test]
    fn test_invalid_email_rejected() {
        assert!(serde_json::from_str::<User>(r#"{"name":"x","email":"nope"}"#).is_err());
    }
}
