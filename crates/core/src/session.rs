//! The client-side session record and its refresh policy
//!
//! A session is cached as two string entries in a key/value store: the
//! serialized [`AuthTokens`] under [`AUTH_DATA_KEY`] and the serialized
//! [`UserProfile`] under [`USER_DATA_KEY`]. The browser widget backs this
//! with `localStorage`; native callers and tests use [`MemoryStore`].

use crate::error::{Result, SessionError};
use crate::types::{AuthTokens, UserProfile, UserSession};
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Storage key for the cached tokens
pub const AUTH_DATA_KEY: &str = "larkAuthData";

/// Storage key for the cached user profile
pub const USER_DATA_KEY: &str = "larkUserData";

/// Minimal string key/value store the session is cached in
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| SessionError::storage("memory store lock poisoned"))
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// When tokens count as "about to expire" and how often to check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Refresh once the access token expires within this window
    pub threshold: TimeDelta,
    /// How often the widget re-checks the cached tokens
    pub interval: Duration,
}

impl RefreshPolicy {
    /// Whether `tokens` should be refreshed at `now`
    pub fn is_due(&self, tokens: &AuthTokens, now: DateTime<Utc>) -> bool {
        tokens.expires_within(now, self.threshold)
    }

    /// Check interval in milliseconds, for browser timers
    pub fn interval_millis(&self) -> u32 {
        u32::try_from(self.interval.as_millis()).unwrap_or(u32::MAX)
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            threshold: TimeDelta::minutes(5),
            interval: Duration::from_secs(4 * 60),
        }
    }
}

/// What the login page finds in the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistingSession {
    /// Nothing cached
    Absent,
    /// Cached tokens are still valid
    Active(AuthTokens),
    /// Cached tokens had expired and were cleared
    Expired,
    /// The cached record could not be parsed and was cleared
    Corrupt,
}

/// Result of one refresh check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No tokens cached, nothing to do
    NoSession,
    /// Tokens are not close enough to expiry
    NotDue,
    /// New tokens were fetched and cached
    Refreshed(AuthTokens),
    /// The refresh call or the cache update failed; the cache is unchanged
    Failed(String),
    /// Another session was stored, or the cache cleared, while the refresh
    /// was in flight; the refreshed tokens were dropped
    Superseded,
}

/// The single cached session record
#[derive(Debug)]
pub struct SessionCache<S> {
    store: S,
    policy: RefreshPolicy,
}

impl<S: SessionStore> SessionCache<S> {
    /// Create a cache with the default refresh policy
    pub fn new(store: S) -> Self {
        Self::with_policy(store, RefreshPolicy::default())
    }

    /// Create a cache with a custom refresh policy
    pub const fn with_policy(store: S, policy: RefreshPolicy) -> Self {
        Self { store, policy }
    }

    pub const fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Cache a freshly fetched session
    pub fn store_session(&self, session: &UserSession) -> Result<()> {
        let user = serde_json::to_string(&session.user)?;
        let auth = serde_json::to_string(&session.auth)?;
        self.store.set(USER_DATA_KEY, &user)?;
        self.store.set(AUTH_DATA_KEY, &auth)?;
        debug!(user_id = %session.user.id, "Stored session");
        Ok(())
    }

    /// Cached tokens, if any
    pub fn tokens(&self) -> Result<Option<AuthTokens>> {
        self.read(AUTH_DATA_KEY)
    }

    /// Cached user profile, if any
    pub fn user(&self) -> Result<Option<UserProfile>> {
        self.read(USER_DATA_KEY)
    }

    fn read<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| SessionError::Corrupt {
                key,
                message: e.to_string(),
            })
    }

    /// Replace the cached tokens with a refresh response
    pub fn replace_tokens(&self, tokens: &AuthTokens) -> Result<()> {
        let auth = serde_json::to_string(tokens)?;
        self.store.set(AUTH_DATA_KEY, &auth)
    }

    /// Drop the cached session
    pub fn clear(&self) -> Result<()> {
        self.store.remove(AUTH_DATA_KEY)?;
        self.store.remove(USER_DATA_KEY)
    }

    /// Inspect the cache on the login page
    ///
    /// Expired or unreadable records are cleared so the user starts a new
    /// login from a clean slate.
    pub fn check_existing(&self, now: DateTime<Utc>) -> Result<ExistingSession> {
        match self.tokens() {
            Ok(None) => Ok(ExistingSession::Absent),
            Ok(Some(tokens)) if !tokens.is_expired(now) => Ok(ExistingSession::Active(tokens)),
            Ok(Some(_)) => {
                info!("Cached session expired, clearing");
                self.clear()?;
                Ok(ExistingSession::Expired)
            }
            Err(e) if e.is_corrupt() => {
                error!("Error parsing auth data: {e}");
                self.clear()?;
                Ok(ExistingSession::Corrupt)
            }
            Err(e) => Err(e),
        }
    }

    /// The refresh token, when the cached tokens are due for refresh
    pub fn refresh_due(&self, now: DateTime<Utc>) -> Result<Option<String>> {
        Ok(self
            .tokens()?
            .filter(|tokens| self.policy.is_due(tokens, now))
            .map(|tokens| tokens.refresh_token))
    }

    /// Refresh the cached tokens through `refresh` if they are due
    ///
    /// `refresh` receives the refresh token and returns the replacement
    /// tokens. Failures are logged and leave the cache untouched; the next
    /// scheduled check tries again. If the cached session changes while the
    /// request is in flight the refreshed tokens are dropped.
    pub async fn refresh_if_due<F, Fut, E>(&self, now: DateTime<Utc>, refresh: F) -> RefreshOutcome
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = std::result::Result<AuthTokens, E>>,
        E: Display,
    {
        let tokens = match self.tokens() {
            Ok(Some(tokens)) => tokens,
            Ok(None) => return RefreshOutcome::NoSession,
            Err(e) => {
                error!("Error refreshing token: {e}");
                return RefreshOutcome::Failed(e.to_string());
            }
        };

        if !self.policy.is_due(&tokens, now) {
            return RefreshOutcome::NotDue;
        }

        if tokens.refresh_expired(now) {
            warn!("Refresh token has lapsed, refresh will likely be rejected");
        }

        info!("Token is about to expire, refreshing...");
        let new_tokens = match refresh(tokens.refresh_token.clone()).await {
            Ok(new_tokens) => new_tokens,
            Err(e) => {
                error!("Error refreshing token: {e}");
                return RefreshOutcome::Failed(e.to_string());
            }
        };

        // The cache may have been replaced or cleared while the request ran
        match self.tokens() {
            Ok(Some(current)) if current.refresh_token == tokens.refresh_token => {}
            Ok(_) | Err(_) => {
                info!("Session changed during refresh, discarding refreshed token");
                return RefreshOutcome::Superseded;
            }
        }

        match self.replace_tokens(&new_tokens) {
            Ok(()) => {
                info!("Token refreshed successfully");
                RefreshOutcome::Refreshed(new_tokens)
            }
            Err(e) => {
                error!("Error storing refreshed token: {e}");
                RefreshOutcome::Failed(e.to_string())
            }
        }
    }
}
