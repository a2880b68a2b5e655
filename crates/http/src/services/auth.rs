//! Authentication service coordinating Lark and the user store

use crate::error::HttpError;
use crate::services::lark::{LarkClient, LarkUserInfo};
use crate::store::{NewUser, UserStore};
use chrono::Utc;
use larkauth_core::{AuthTokens, UserSession};
use std::sync::Arc;
use tracing::instrument;
use url::Url;

/// Sign-in flow on the backend side
pub struct AuthService {
    lark: LarkClient,
    store: Arc<dyn UserStore>,
}

impl AuthService {
    pub fn new(lark: LarkClient, store: Arc<dyn UserStore>) -> Self {
        Self { lark, store }
    }

    /// Where to send the browser to start a login
    pub fn login_url(&self) -> Result<Url, HttpError> {
        let url = self.lark.authorize_url()?;
        info!("Redirecting to Lark auth URL: {url}");
        Ok(url)
    }

    /// Finish a login from the authorization code Lark redirected back with
    #[instrument(name = "auth.complete_login", skip_all)]
    pub async fn complete_login(&self, code: &str) -> Result<UserSession, HttpError> {
        if code.is_empty() {
            return Err(HttpError::BadRequest(
                "Missing authorization code".to_string(),
            ));
        }

        let tokens = self.lark.exchange_code(code).await?;
        let info = self.lark.user_info(&tokens.access_token).await?;
        let new_user = required_profile(info)?;

        let returning = self.store.find_by_open_id(&new_user.open_id).await?.is_some();
        let user = self.store.upsert_user(new_user, Utc::now()).await?;
        self.store.put_auth(&user.id, &tokens).await?;

        if returning {
            info!(user_id = %user.id, open_id = %user.open_id, "Existing user signed in");
        } else {
            info!(user_id = %user.id, open_id = %user.open_id, "New user created");
        }
        Ok(UserSession { user, auth: tokens })
    }

    /// Trade a refresh token for new tokens
    #[instrument(name = "auth.refresh", skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, HttpError> {
        if refresh_token.is_empty() {
            return Err(HttpError::BadRequest("Missing refresh token".to_string()));
        }

        let tokens = self.lark.refresh(refresh_token).await?;
        debug!(expires_at = %tokens.expires_at, "Token refreshed");
        Ok(tokens)
    }

    /// The stored profile and tokens for a user
    #[instrument(name = "auth.session", skip(self))]
    pub async fn session(&self, user_id: &str) -> Result<UserSession, HttpError> {
        let Some(user) = self.store.get_user(user_id).await? else {
            return Err(HttpError::NotFound("User not found".to_string()));
        };

        let Some(auth) = self.store.get_auth(user_id).await? else {
            return Err(HttpError::NotFound(
                "Auth information not found".to_string(),
            ));
        };

        Ok(UserSession { user, auth })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn required_profile(info: LarkUserInfo) -> Result<NewUser, HttpError> {
    let missing =
        |field: &str| HttpError::BadRequest(format!("Missing required user information: {field}"));

    Ok(NewUser {
        open_id: info.open_id.ok_or_else(|| missing("open_id"))?,
        union_id: info.union_id.ok_or_else(|| missing("union_id"))?,
        name: info.name.ok_or_else(|| missing("name"))?,
        email: non_empty(info.email),
        avatar_url: non_empty(info.avatar_url),
    })
}
