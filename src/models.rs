use crate::errors::SessionError;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Value of `ErrorBody::error` that signals server-side token invalidation
pub const INVALID_TOKEN_ERROR: &str = "invalid_token";

/// The persisted authentication record.
///
/// A session is always complete: records missing a field, or carrying a
/// blank identity/token, are rejected by [`Session::parse`] and never reach
/// the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Displayable login name
    #[serde(alias = "login")]
    pub identity: String,
    #[serde(
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub token: SecretString,
    /// Absolute expiry, RFC 3339 on the wire
    #[serde(alias = "expires")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        identity: impl Into<String>,
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Session {
            identity: identity.into(),
            token: SecretString::new(token.into()),
            expires_at,
        }
    }

    /// Session that expires `lifetime` from now
    pub fn expiring_in(
        identity: impl Into<String>,
        token: impl Into<String>,
        lifetime: Duration,
    ) -> Self {
        Self::new(identity, token, Utc::now() + lifetime)
    }

    /// Parse and validate a stored record
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        let session: Session = serde_json::from_str(raw)?;
        session.validate()?;
        Ok(session)
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.identity.trim().is_empty() {
            return Err(SessionError::InvalidSession {
                reason: "identity is empty".to_string(),
            });
        }

        let token = self.token.expose_secret();
        if token.trim().is_empty() {
            return Err(SessionError::InvalidSession {
                reason: "token is empty".to_string(),
            });
        }
        // The token ends up in an Authorization header
        if !token.chars().all(|c| c.is_ascii_graphic()) {
            return Err(SessionError::InvalidSession {
                reason: "token contains characters not allowed in a header".to_string(),
            });
        }

        Ok(())
    }

    /// Expired at `now`; a session expiring exactly at `now` counts as expired
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }

    /// Minutes remaining, for display
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }

    pub fn bearer_value(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.token.expose_secret() == other.token.expose_secret()
            && self.expires_at == other.expires_at
    }
}

impl Eq for Session {}

/// Error payload returned by the API with a 401
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl ErrorBody {
    pub fn is_invalid_token(&self) -> bool {
        self.error == INVALID_TOKEN_ERROR
    }
}

// Custom serialization for SecretString
pub fn serialize_secret<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::ser::Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

pub fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(SecretString::new(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Session {
        Session::new(
            "alice",
            "tok_123",
            Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_session_json_field_names() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["identity"], "alice");
        assert_eq!(value["token"], "tok_123");
        assert_eq!(value["expiresAt"], "2030-01-01T12:00:00Z");
    }

    #[test]
    fn test_parse_session() {
        let raw = r#"{"identity":"alice","token":"tok_123","expiresAt":"2030-01-01T12:00:00Z"}"#;
        let session = Session::parse(raw).unwrap();
        assert_eq!(session, sample());
    }

    #[test]
    fn test_parse_legacy_field_names() {
        // Records written by the web client use `login` and `expires`
        let raw = r#"{"login":"alice","token":"tok_123","expires":"2030-01-01T13:00:00+01:00"}"#;
        let session = Session::parse(raw).unwrap();
        assert_eq!(session, sample());
    }

    #[test]
    fn test_parse_rejects_partial_session() {
        let missing_token = r#"{"identity":"alice","expiresAt":"2030-01-01T12:00:00Z"}"#;
        assert!(Session::parse(missing_token).is_err());

        let missing_expiry = r#"{"identity":"alice","token":"tok_123"}"#;
        assert!(Session::parse(missing_expiry).is_err());

        let bad_timestamp = r#"{"identity":"alice","token":"t","expiresAt":"tomorrow"}"#;
        assert!(Session::parse(bad_timestamp).is_err());
    }

    #[test]
    fn test_parse_rejects_blank_fields() {
        let blank_token = r#"{"identity":"alice","token":"  ","expiresAt":"2030-01-01T12:00:00Z"}"#;
        assert!(matches!(
            Session::parse(blank_token),
            Err(SessionError::InvalidSession { .. })
        ));

        let blank_identity = r#"{"identity":"","token":"tok","expiresAt":"2030-01-01T12:00:00Z"}"#;
        assert!(matches!(
            Session::parse(blank_identity),
            Err(SessionError::InvalidSession { .. })
        ));
    }

    #[test]
    fn test_token_must_fit_in_header() {
        let session = Session::new("alice", "tok\n123", Utc::now());
        assert!(session.validate().is_err());
    }

    #[test]
    fn test_expiry_boundary() {
        let session = sample();
        let at = session.expires_at;

        assert!(!session.is_expired_at(at - Duration::seconds(1)));
        assert!(session.is_expired_at(at));
        assert!(session.is_expired_at(at + Duration::seconds(1)));
    }

    #[test]
    fn test_minutes_until_expiry_is_clamped() {
        let expired = Session::expiring_in("alice", "tok", Duration::hours(-1));
        assert_eq!(expired.minutes_until_expiry(), 0);

        let fresh = Session::expiring_in("alice", "tok", Duration::minutes(90));
        assert!(fresh.minutes_until_expiry() >= 89);
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", sample());
        assert!(!debug.contains("tok_123"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn test_bearer_value() {
        assert_eq!(sample().bearer_value(), "Bearer tok_123");
    }

    #[test]
    fn test_error_body() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"invalid_token"}"#).unwrap();
        assert!(body.is_invalid_token());
        assert!(body.error_description.is_none());

        let body: ErrorBody = serde_json::from_str(r#"{"error":"forbidden"}"#).unwrap();
        assert!(!body.is_invalid_token());
    }
}
