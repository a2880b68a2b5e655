//! Typed client for the larkauth backend

pub mod error;

use crate::error::ErrorResponse;
use error::ClientError;
use larkauth_core::{AuthTokens, RefreshTokenRequest, UserSession};
use reqwest::{Client, ClientBuilder, Method};
use url::Url;

/// Larkauth backend client
#[derive(Debug, Clone)]
pub struct LarkAuthClient {
    client: Client,
    base_url: Url,
}

impl LarkAuthClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> LarkAuthClientBuilder {
        LarkAuthClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Configuration("base_url cannot be a base URL".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL that starts a Lark login; the browser navigates here
    pub fn login_url(&self) -> Result<Url, ClientError> {
        self.url(&["api", "auth", "user", "lark", "login"])
    }

    /// Fetch the session the backend stored for `user_id`
    pub async fn user_session(&self, user_id: &str) -> Result<UserSession, ClientError> {
        let url = self.url(&["api", "user", user_id])?;
        tracing::debug!(user_id, "Fetching user session");
        self.execute(self.client.request(Method::GET, url)).await
    }

    /// Exchange a refresh token for new tokens
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, ClientError> {
        let url = self.url(&["api", "auth", "user", "lark", "refresh"])?;
        let body = RefreshTokenRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.execute(self.client.request(Method::POST, url).json(&body))
            .await
    }

    /// Execute a request and handle common errors
    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let text = response.text().await.unwrap_or_else(|_| status.to_string());
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            Err(ClientError::from_status(status, message))
        }
    }
}

/// Builder for LarkAuthClient
#[derive(Default)]
pub struct LarkAuthClientBuilder {
    base_url: Option<String>,
}

impl LarkAuthClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<LarkAuthClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;
        let base_url = Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url: {e}")))?;

        // The browser sets its own user agent
        #[cfg(not(target_arch = "wasm32"))]
        let client_builder = ClientBuilder::new()
            .user_agent(concat!("larkauth-client/", env!("CARGO_PKG_VERSION")));
        #[cfg(target_arch = "wasm32")]
        let client_builder = ClientBuilder::new();

        let client = client_builder.build()?;

        Ok(LarkAuthClient { client, base_url })
    }
}
