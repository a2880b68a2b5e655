//! User and token persistence for the backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use larkauth_core::{AuthTokens, UserProfile};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors raised by a [`UserStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Profile fields taken from Lark on each login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: Option<String>,
    pub open_id: String,
    pub union_id: String,
    pub avatar_url: Option<String>,
}

/// Storage for signed-in users and their latest tokens
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<UserProfile>, StoreError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;
    /// Create the user, or update the profile of the user with the same `open_id`
    async fn upsert_user(
        &self,
        user: NewUser,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, StoreError>;
    async fn get_auth(&self, user_id: &str) -> Result<Option<AuthTokens>, StoreError>;
    async fn put_auth(&self, user_id: &str, tokens: &AuthTokens) -> Result<(), StoreError>;
}

/// Process-local store; contents are lost on restart
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserProfile>>,
    auth: RwLock<HashMap<String, AuthTokens>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.open_id == open_id).cloned())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn upsert_user(
        &self,
        user: NewUser,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, StoreError> {
        let mut users = self.users.write().await;

        if let Some(existing) = users.values_mut().find(|u| u.open_id == user.open_id) {
            existing.name = user.name;
            existing.email = user.email;
            existing.avatar_url = user.avatar_url;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let profile = UserProfile {
            id: uuid::Uuid::new_v4().to_string(),
            name: user.name,
            email: user.email,
            open_id: user.open_id,
            union_id: user.union_id,
            avatar_url: user.avatar_url,
            created_at: now,
            updated_at: now,
        };
        users.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    async fn get_auth(&self, user_id: &str) -> Result<Option<AuthTokens>, StoreError> {
        Ok(self.auth.read().await.get(user_id).cloned())
    }

    async fn put_auth(&self, user_id: &str, tokens: &AuthTokens) -> Result<(), StoreError> {
        self.auth
            .write()
            .await
            .insert(user_id.to_string(), tokens.clone());
        Ok(())
    }
}
