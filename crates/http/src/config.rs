//! Backend configuration sections

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default Lark Open API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://open.larksuite.com/open-apis";

/// Default Lark authorization base URL
pub const DEFAULT_AUTH_BASE_URL: &str = "https://accounts.larksuite.com/open-apis";

/// Lark application credentials and endpoints
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LarkConfig {
    pub app_id: String,
    pub app_secret: String,
    pub api_base_url: String,
    pub auth_base_url: String,
    /// Callback URL registered with the Lark app
    pub redirect_uri: String,
    /// Timeout for each call to Lark
    pub timeout_seconds: u64,
}

impl Default for LarkConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            redirect_uri: String::new(),
            timeout_seconds: 30,
        }
    }
}

impl LarkConfig {
    /// Names of required settings that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("app_id", &self.app_id),
            ("app_secret", &self.app_secret),
            ("redirect_uri", &self.redirect_uri),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl fmt::Debug for LarkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LarkConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("auth_base_url", &self.auth_base_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Where the widget lives relative to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Page the login callback redirects to, with `?userId=` appended
    pub success_path: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            success_path: "/static/login-success.html".to_string(),
        }
    }
}
