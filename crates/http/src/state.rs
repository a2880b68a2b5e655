//! Application state management

use crate::config::FrontendConfig;
use crate::services::AuthService;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Sign-in flow
    pub auth_service: Arc<AuthService>,
    /// Page the login callback redirects to
    pub success_path: Arc<str>,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>, frontend: &FrontendConfig) -> Self {
        Self {
            auth_service,
            success_path: Arc::from(frontend.success_path.as_str()),
        }
    }

    /// Redirect target after a successful login
    pub fn success_redirect(&self, user_id: &str) -> String {
        let separator = if self.success_path.contains('?') {
            '&'
        } else {
            '?'
        };
        format!("{}{separator}userId={user_id}", self.success_path)
    }
}
