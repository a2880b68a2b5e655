//! Client for the Lark Open API endpoints used during sign-in

use crate::config::LarkConfig;
use chrono::{DateTime, Utc};
use larkauth_core::AuthTokens;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use thiserror::Error;
use tracing::instrument;
use url::Url;

/// Access token lifetime when Lark omits `expires_in`
pub const DEFAULT_EXPIRES_IN: i64 = 7200;

/// Refresh token lifetime when Lark omits `refresh_expires_in`
pub const DEFAULT_REFRESH_EXPIRES_IN: i64 = 2_592_000;

/// Errors talking to Lark
#[derive(Debug, Error)]
pub enum LarkError {
    /// Network failure, timeout or non-2xx status
    #[error("Failed to communicate with Lark API: {0}")]
    Transport(#[from] reqwest::Error),

    /// Lark answered with a non-zero `code`
    #[error("Failed to {operation}: {message}")]
    Api {
        operation: &'static str,
        code: i64,
        message: String,
    },

    /// Lark answered `code = 0` without the expected payload
    #[error("Failed to {operation}: response is missing {field}")]
    MissingData {
        operation: &'static str,
        field: &'static str,
    },

    /// A token lifetime that puts the expiry out of range
    #[error("Failed to {operation}: token lifetime is out of range")]
    InvalidLifetime { operation: &'static str },

    #[error("Invalid Lark URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Standard `{code, msg, data}` response wrapper
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

/// The app token endpoint returns its payload at the top level
#[derive(Debug, Deserialize)]
struct AppAccessTokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    app_access_token: Option<String>,
}

/// Token payload of the OIDC access and refresh endpoints
#[derive(Deserialize)]
struct TokenData {
    access_token: Option<String>,
    token_type: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    refresh_expires_in: Option<i64>,
}

impl TokenData {
    fn into_tokens(
        self,
        operation: &'static str,
        now: DateTime<Utc>,
    ) -> Result<AuthTokens, LarkError> {
        let access_token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(LarkError::MissingData {
                operation,
                field: "access_token",
            })?;
        let refresh_token = self
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(LarkError::MissingData {
                operation,
                field: "refresh_token",
            })?;

        AuthTokens::from_lifetimes(
            access_token,
            self.token_type,
            refresh_token,
            self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            self.refresh_expires_in.unwrap_or(DEFAULT_REFRESH_EXPIRES_IN),
            now,
        )
        .ok_or(LarkError::InvalidLifetime { operation })
    }
}

/// Profile returned by `authen/v1/user_info`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LarkUserInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub open_id: Option<String>,
    pub union_id: Option<String>,
}

/// Lark Open API client
#[derive(Debug, Clone)]
pub struct LarkClient {
    http: Client,
    config: LarkConfig,
}

impl LarkClient {
    /// Create a client using the configured timeout
    pub fn new(config: LarkConfig) -> Result<Self, LarkError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("larkauth/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    pub const fn config(&self) -> &LarkConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.api_base_url.trim_end_matches('/'))
    }

    /// URL of the Lark consent page the browser is sent to
    pub fn authorize_url(&self) -> Result<Url, LarkError> {
        let base = format!(
            "{}/authen/v1/authorize",
            self.config.auth_base_url.trim_end_matches('/')
        );
        Ok(Url::parse_with_params(
            &base,
            &[
                ("app_id", self.config.app_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
            ],
        )?)
    }

    /// Fetch an app access token for the configured app
    #[instrument(name = "lark.app_access_token", skip(self))]
    pub async fn app_access_token(&self) -> Result<String, LarkError> {
        const OPERATION: &str = "get app access token";

        let response: AppAccessTokenResponse = self
            .http
            .post(self.endpoint("auth/v3/app_access_token/internal"))
            .json(&json!({
                "app_id": self.config.app_id,
                "app_secret": self.config.app_secret,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.code != 0 {
            return Err(api_error(OPERATION, response.code, response.msg));
        }

        response
            .app_access_token
            .filter(|t| !t.is_empty())
            .ok_or(LarkError::MissingData {
                operation: OPERATION,
                field: "app_access_token",
            })
    }

    /// Exchange an authorization code for user tokens
    #[instrument(name = "lark.exchange_code", skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<AuthTokens, LarkError> {
        const OPERATION: &str = "get user access token";

        let app_token = self.app_access_token().await?;
        let request = self
            .http
            .post(self.endpoint("authen/v1/oidc/access_token"))
            .bearer_auth(app_token)
            .json(&json!({
                "grant_type": "authorization_code",
                "code": code,
            }));

        let data: TokenData = self.call(OPERATION, request).await?;
        data.into_tokens(OPERATION, Utc::now())
    }

    /// Fetch the signed-in user's profile
    #[instrument(name = "lark.user_info", skip_all)]
    pub async fn user_info(&self, access_token: &str) -> Result<LarkUserInfo, LarkError> {
        let request = self
            .http
            .get(self.endpoint("authen/v1/user_info"))
            .bearer_auth(access_token);

        self.call("get user info", request).await
    }

    /// Trade a refresh token for a new token pair
    #[instrument(name = "lark.refresh", skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, LarkError> {
        const OPERATION: &str = "refresh token";

        let app_token = self.app_access_token().await?;
        let request = self
            .http
            .post(self.endpoint("authen/v1/oidc/refresh_access_token"))
            .bearer_auth(app_token)
            .json(&json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token,
            }));

        let data: TokenData = self.call(OPERATION, request).await?;
        data.into_tokens(OPERATION, Utc::now())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, LarkError> {
        let envelope: Envelope<T> = request.send().await?.error_for_status()?.json().await?;

        if envelope.code != 0 {
            return Err(api_error(operation, envelope.code, envelope.msg));
        }

        envelope.data.ok_or(LarkError::MissingData {
            operation,
            field: "data",
        })
    }
}

fn api_error(operation: &'static str, code: i64, message: String) -> LarkError {
    error!(code, "Failed to {operation}: {message}");
    LarkError::Api {
        operation,
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> LarkConfig {
        LarkConfig {
            app_id: "cli_test".to_string(),
            app_secret: "secret".to_string(),
            api_base_url: format!("{}/open-apis", server.uri()),
            auth_base_url: "https://accounts.larksuite.com/open-apis".to_string(),
            redirect_uri: "http://localhost:8000/api/auth/user/lark/callback".to_string(),
            timeout_seconds: 5,
        }
    }

    async fn mount_app_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/open-apis/auth/v3/app_access_token/internal"))
            .and(body_json(json!({"app_id": "cli_test", "app_secret": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "msg": "ok",
                "app_access_token": "a-app-token",
                "expire": 7200
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_authorize_url_encodes_redirect() {
        let server = MockServer::start().await;
        let client = LarkClient::new(config(&server)).unwrap();

        let url = client.authorize_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://accounts.larksuite.com/open-apis/authen/v1/authorize\
             ?app_id=cli_test\
             &redirect_uri=http%3A%2F%2Flocalhost%3A8000%2Fapi%2Fauth%2Fuser%2Flark%2Fcallback\
             &response_type=code"
        );
    }

    #[tokio::test]
    async fn test_exchange_code_computes_expiry() {
        let server = MockServer::start().await;
        mount_app_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/open-apis/authen/v1/oidc/access_token"))
            .and(header("authorization", "Bearer a-app-token"))
            .and(body_json(json!({"grant_type": "authorization_code", "code": "abc"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "msg": "success",
                "data": {
                    "access_token": "u-access",
                    "refresh_token": "ur-refresh",
                    "token_type": "Bearer",
                    "expires_in": 6900,
                    "refresh_expires_in": 2_591_700
                }
            })))
            .mount(&server)
            .await;

        let client = LarkClient::new(config(&server)).unwrap();
        let before = Utc::now();
        let tokens = client.exchange_code("abc").await.unwrap();

        assert_eq!(tokens.access_token, "u-access");
        assert_eq!(tokens.refresh_token, "ur-refresh");
        assert!(tokens.expires_at >= before + chrono::TimeDelta::seconds(6900));
        assert!(tokens.expires_at <= Utc::now() + chrono::TimeDelta::seconds(6900));
    }

    #[tokio::test]
    async fn test_refresh_defaults_lifetimes() {
        let server = MockServer::start().await;
        mount_app_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/open-apis/authen/v1/oidc/refresh_access_token"))
            .and(body_json(json!({"grant_type": "refresh_token", "refresh_token": "ur-old"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "data": {"access_token": "u-new", "refresh_token": "ur-new"}
            })))
            .mount(&server)
            .await;

        let client = LarkClient::new(config(&server)).unwrap();
        let now = Utc::now();
        let tokens = client.refresh("ur-old").await.unwrap();

        assert_eq!(tokens.token_type, "Bearer");
        let lifetime = tokens.expires_at - now;
        assert!(lifetime >= chrono::TimeDelta::seconds(DEFAULT_EXPIRES_IN - 5));
        assert!(lifetime <= chrono::TimeDelta::seconds(DEFAULT_EXPIRES_IN + 5));
    }

    #[tokio::test]
    async fn test_non_zero_code_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/open-apis/authen/v1/user_info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 20005,
                "msg": "invalid access token"
            })))
            .mount(&server)
            .await;

        let client = LarkClient::new(config(&server)).unwrap();
        let err = client.user_info("u-bad").await.unwrap_err();

        assert!(matches!(err, LarkError::Api { code: 20005, .. }));
        assert_eq!(err.to_string(), "Failed to get user info: invalid access token");
    }

    #[tokio::test]
    async fn test_http_failure_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/open-apis/auth/v3/app_access_token/internal"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = LarkClient::new(config(&server)).unwrap();
        let err = client.app_access_token().await.unwrap_err();
        assert!(matches!(err, LarkError::Transport(_)));
    }

    #[tokio::test]
    async fn test_missing_access_token() {
        let server = MockServer::start().await;
        mount_app_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/open-apis/authen/v1/oidc/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "data": {"refresh_token": "ur-refresh"}
            })))
            .mount(&server)
            .await;

        let client = LarkClient::new(config(&server)).unwrap();
        let err = client.exchange_code("abc").await.unwrap_err();
        assert!(matches!(
            err,
            LarkError::MissingData {
                field: "access_token",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_lifetime_is_rejected() {
        let server = MockServer::start().await;
        mount_app_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/open-apis/authen/v1/oidc/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "data": {
                    "access_token": "u-access",
                    "refresh_token": "ur-refresh",
                    "expires_in": 9_000_000_000_000_000_000_i64
                }
            })))
            .mount(&server)
            .await;

        let client = LarkClient::new(config(&server)).unwrap();
        let err = client.exchange_code("abc").await.unwrap_err();
        assert!(matches!(err, LarkError::InvalidLifetime { .. }));
        assert_eq!(
            HttpError::from(err).message(),
            "Failed to get user access token: token lifetime is out of range"
        );
    }
}
