//! Authenticated user and session models as issued by the backend's auth API.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The signed-in operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token grant returned by the auth API.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Absolute expiry, unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

/// An active backend session held by one client context.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: User,
}

impl Session {
    pub fn from_grant(grant: TokenGrant, now: DateTime<Utc>) -> Self {
        let expires_at = grant
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| grant.expires_in.map(|secs| now + Duration::seconds(secs)));

        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at,
            user: grant.user,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}
