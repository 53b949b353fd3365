//! Account, login and profile payloads of the identity service.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Registration payload for `POST /register`.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    /// Account email address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Plain-text password, only ever sent over the wire.
    pub password: String,
}

impl RegisterRequest {
    /// Returns the email/password pair to sign in with once registration succeeds.
    ///
    /// Both values must be non-blank, otherwise there is nothing to log in with.
    #[must_use]
    pub fn login_credentials(&self) -> Option<(&str, &str)> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return None;
        }
        Some((email, self.password.as_str()))
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credentials for `POST /login`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account email address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body returned by a successful login.
///
/// Deployments of the identity service disagree on the field name, so all
/// three spellings are accepted.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    /// Token under its usual name.
    #[serde(default)]
    pub token: Option<String>,
    /// OAuth-style spelling.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Spelling used by older deployments.
    #[serde(default)]
    pub jwt: Option<String>,
}

impl LoginResponse {
    /// The first non-empty token field, checked as `token`, `access_token`, `jwt`.
    #[must_use]
    pub fn into_token(self) -> Option<String> {
        [self.token, self.access_token, self.jwt]
            .into_iter()
            .flatten()
            .find(|token| !token.is_empty())
    }
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("LoginResponse")
            .field("token", &redact(&self.token))
            .field("access_token", &redact(&self.access_token))
            .field("jwt", &redact(&self.jwt))
            .finish()
    }
}

/// Profile as returned by `GET /me`.
///
/// The admin flag is deliberately absent: privilege is only ever taken from
/// `GET /is-admin/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileRecord {
    /// Numeric user id, the key for the admin-flag lookup.
    pub id: i64,
    /// Account email address.
    pub email: String,
    /// Given name, when the account has one.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name, when the account has one.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Account creation time in UTC. Unparseable values are dropped.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<NaiveDateTime>,
}

/// Response of `GET /is-admin/{id}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IsAdminResponse {
    /// Whether the user holds the admin role.
    pub is_admin: bool,
}

/// Resolved identity of the signed-in user, including the privilege flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Numeric user id.
    pub id: i64,
    /// Account email address.
    pub email: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Account creation time in UTC.
    pub created_at: Option<NaiveDateTime>,
    /// Privilege flag from `GET /is-admin/{id}`, never from `/me`.
    pub is_admin: bool,
}

/// Accepts naive ISO-8601 timestamps as well as RFC 3339 ones carrying an
/// offset or `Z`, normalised to UTC. Anything else becomes `None` so a
/// cosmetic field can't fail the whole profile.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::String(raw)) = value else {
        return Ok(None);
    };
    let raw = raw.trim();
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|stamp| stamp.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok();
    if parsed.is_none() {
        tracing::debug!(value = raw, "ignoring unparseable created_at");
    }
    Ok(parsed)
}

impl Profile {
    /// Combines a `/me` record with the separately resolved admin flag.
    #[must_use]
    pub fn from_record(record: ProfileRecord, is_admin: bool) -> Self {
        Self {
            id: record.id,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            created_at: record.created_at,
            is_admin,
        }
    }

    /// "First Last" when either name is known, otherwise the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            self.email.clone()
        } else {
            parts.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_response_prefers_token_field() {
        let body: LoginResponse = serde_json::from_value(json!({
            "token": "t1",
            "access_token": "t2",
            "jwt": "t3"
        }))
        .unwrap();
        assert_eq!(body.into_token().as_deref(), Some("t1"));
    }

    #[test]
    fn test_login_response_falls_back_to_access_token_and_jwt() {
        let access: LoginResponse =
            serde_json::from_value(json!({ "access_token": "abc" })).unwrap();
        assert_eq!(access.into_token().as_deref(), Some("abc"));

        let jwt: LoginResponse =
            serde_json::from_value(json!({ "token": "", "jwt": "xyz" })).unwrap();
        assert_eq!(jwt.into_token().as_deref(), Some("xyz"));
    }

    #[test]
    fn test_login_response_without_token() {
        let body: LoginResponse = serde_json::from_value(json!({ "message": "ok" })).unwrap();
        assert_eq!(body.into_token(), None);
    }

    #[test]
    fn test_login_response_debug_redacts_token() {
        let body: LoginResponse = serde_json::from_value(json!({ "token": "secret" })).unwrap();
        let debug = format!("{body:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_register_request_login_credentials() {
        let request = RegisterRequest {
            email: " x@y.com ".to_string(),
            first_name: "X".to_string(),
            last_name: "Y".to_string(),
            password: "p".to_string(),
        };
        assert_eq!(request.login_credentials(), Some(("x@y.com", "p")));

        let no_password = RegisterRequest {
            password: String::new(),
            ..request.clone()
        };
        assert_eq!(no_password.login_credentials(), None);

        let no_email = RegisterRequest {
            email: "  ".to_string(),
            ..request
        };
        assert_eq!(no_email.login_credentials(), None);
    }

    #[test]
    fn test_register_request_debug_redacts_password() {
        let request = RegisterRequest {
            email: "x@y.com".to_string(),
            password: "hunter2".to_string(),
            ..Default::default()
        };
        assert!(!format!("{request:?}").contains("hunter2"));
    }

    #[test]
    fn test_profile_record_ignores_server_admin_flag() {
        let record: ProfileRecord = serde_json::from_value(json!({
            "id": 7,
            "email": "a@b.com",
            "first_name": "Ada",
            "last_name": "Byron",
            "created_at": "2024-05-01T10:11:12.123456",
            "is_admin": true
        }))
        .unwrap();
        assert_eq!(record.id, 7);
        assert!(record.created_at.is_some());

        let profile = Profile::from_record(record, false);
        assert!(!profile.is_admin);
        assert_eq!(profile.display_name(), "Ada Byron");
    }

    #[test]
    fn test_profile_record_minimal_body() {
        let record: ProfileRecord =
            serde_json::from_value(json!({ "id": 7, "email": "a@b.com" })).unwrap();
        assert_eq!(record.first_name, None);
        assert_eq!(record.created_at, None);
        assert_eq!(Profile::from_record(record, true).display_name(), "a@b.com");
    }

    #[test]
    fn test_profile_record_accepts_offset_timestamps() {
        for raw in [
            "2024-05-01T10:11:12+00:00",
            "2024-05-01T10:11:12Z",
            "2024-05-01T12:11:12+02:00",
            "2024-05-01 10:11:12",
        ] {
            let record: ProfileRecord = serde_json::from_value(json!({
                "id": 7,
                "email": "a@b.com",
                "created_at": raw
            }))
            .unwrap();
            let expected =
                NaiveDateTime::parse_from_str("2024-05-01 10:11:12", "%Y-%m-%d %H:%M:%S").unwrap();
            assert_eq!(record.created_at, Some(expected), "{raw}");
        }
    }

    #[test]
    fn test_profile_record_tolerates_bad_timestamps() {
        for raw in [json!("yesterday"), json!(1_714_558_272), json!(null)] {
            let record: ProfileRecord = serde_json::from_value(json!({
                "id": 7,
                "email": "a@b.com",
                "created_at": raw
            }))
            .unwrap();
            assert_eq!(record.created_at, None);
        }
    }

    #[test]
    fn test_is_admin_response() {
        let flag: IsAdminResponse = serde_json::from_value(json!({ "is_admin": true })).unwrap();
        assert!(flag.is_admin);
        assert!(serde_json::from_value::<IsAdminResponse>(json!({ "error": "nope" })).is_err());
    }
}
