//! Records exchanged between the backend and the widget

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Profile of a signed-in Lark user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub struct UserProfile {
    /// Server-assigned user ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Email, when Lark shares it
    #[serde(default)]
    pub email: Option<String>,
    /// Lark open_id, unique per app
    pub open_id: String,
    /// Lark union_id, unique per developer
    pub union_id: String,
    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn expiry(now: DateTime<Utc>, lifetime: i64) -> Option<DateTime<Utc>> {
    now.checked_add_signed(TimeDelta::try_seconds(lifetime)?)
}

/// Access and refresh tokens with absolute expiry times
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub struct AuthTokens {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub refresh_token: String,
    /// When the access token stops being accepted
    pub expires_at: DateTime<Utc>,
    /// When the refresh token stops being accepted
    pub refresh_expires_at: DateTime<Utc>,
}

impl AuthTokens {
    /// Build tokens from relative lifetimes in seconds
    ///
    /// Returns `None` when either lifetime puts the expiry outside the
    /// representable date range.
    pub fn from_lifetimes(
        access_token: String,
        token_type: Option<String>,
        refresh_token: String,
        expires_in: i64,
        refresh_expires_in: i64,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        Some(Self {
            access_token,
            token_type: token_type.unwrap_or_else(default_token_type),
            refresh_token,
            expires_at: expiry(now, expires_in)?,
            refresh_expires_at: expiry(now, refresh_expires_in)?,
        })
    }

    /// Whether the access token is no longer valid at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether the access token expires at or before `now + window`
    pub fn expires_within(&self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        self.expires_at <= now + window
    }

    /// Whether the refresh token itself has lapsed
    pub fn refresh_expired(&self, now: DateTime<Utc>) -> bool {
        self.refresh_expires_at <= now
    }
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}

/// A user together with their current tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub struct UserSession {
    pub user: UserProfile,
    pub auth: AuthTokens,
}

/// Body of the token refresh endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(expires_at: DateTime<Utc>) -> AuthTokens {
        AuthTokens {
            access_token: "u-access".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: "ur-refresh".to_string(),
            expires_at,
            refresh_expires_at: expires_at + TimeDelta::days(30),
        }
    }

    #[test]
    fn test_expiry_boundaries() {
        let now = Utc::now();
        assert!(tokens(now).is_expired(now));
        assert!(!tokens(now + TimeDelta::seconds(1)).is_expired(now));

        let window = TimeDelta::minutes(5);
        assert!(tokens(now + window).expires_within(now, window));
        assert!(!tokens(now + window + TimeDelta::seconds(1)).expires_within(now, window));
    }

    #[test]
    fn test_from_lifetimes_defaults_token_type() {
        let now = Utc::now();
        let tokens =
            AuthTokens::from_lifetimes("a".into(), None, "r".into(), 7200, 2_592_000, now)
                .unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_at, now + TimeDelta::seconds(7200));
        assert_eq!(tokens.refresh_expires_at, now + TimeDelta::days(30));
    }

    #[test]
    fn test_from_lifetimes_rejects_out_of_range() {
        let now = Utc::now();
        let huge = 9_000_000_000_000_000_000;
        assert!(AuthTokens::from_lifetimes("a".into(), None, "r".into(), huge, 60, now).is_none());
        assert!(AuthTokens::from_lifetimes("a".into(), None, "r".into(), 60, huge, now).is_none());
        assert!(
            AuthTokens::from_lifetimes("a".into(), None, "r".into(), i64::MAX / 1000, 60, now)
                .is_none()
        );
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", tokens(Utc::now()));
        assert!(!rendered.contains("u-access"));
        assert!(!rendered.contains("ur-refresh"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_missing_token_type_deserializes_as_bearer() {
        let json = r#"{
            "access_token": "a",
            "refresh_token": "r",
            "expires_at": "2030-01-01T00:00:00Z",
            "refresh_expires_at": "2030-02-01T00:00:00Z"
        }"#;
        let tokens: AuthTokens = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.token_type, "Bearer");
    }
}
