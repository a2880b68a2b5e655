//! HTTP error types and implementations

#[cfg(feature = "server")]
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP-specific errors
#[derive(Error, Debug)]
pub enum HttpError {
    /// Lark rejected the code, token or app credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    /// Lark could not be reached
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl HttpError {
    /// The detail message without the error kind prefix
    pub fn message(&self) -> &str {
        match self {
            Self::AuthenticationFailed(m)
            | Self::NotFound(m)
            | Self::BadRequest(m)
            | Self::InternalServerError(m)
            | Self::ServiceUnavailable(m) => m,
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[cfg(feature = "server")]
impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Self::AuthenticationFailed(_) => (StatusCode::UNAUTHORIZED, "authentication_failed"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::InternalServerError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_server_error")
            }
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"),
        };

        if status.is_server_error() {
            tracing::error!("{self}");
        } else {
            tracing::warn!("{self}");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.message().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(feature = "server")]
impl From<crate::services::lark::LarkError> for HttpError {
    fn from(err: crate::services::lark::LarkError) -> Self {
        use crate::services::lark::LarkError;
        match err {
            LarkError::Transport(_) => {
                Self::ServiceUnavailable("Failed to communicate with Lark API".to_string())
            }
            LarkError::Api { .. }
            | LarkError::MissingData { .. }
            | LarkError::InvalidLifetime { .. } => {
                Self::AuthenticationFailed(err.to_string())
            }
            LarkError::InvalidUrl(_) => Self::InternalServerError(err.to_string()),
        }
    }
}

#[cfg(feature = "server")]
impl From<crate::store::StoreError> for HttpError {
    fn from(err: crate::store::StoreError) -> Self {
        Self::InternalServerError(err.to_string())
    }
}

/// Result type alias using HttpError
pub type Result<T> = std::result::Result<T, HttpError>;

#[cfg(all(test, feature = "server"))]
mod tests {
    use super::*;
    use crate::services::lark::LarkError;

    #[tokio::test]
    async fn test_error_body_carries_detail_message() {
        let response = HttpError::NotFound("User not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "not_found");
        assert_eq!(body.message, "User not found");
    }

    #[test]
    fn test_lark_api_errors_are_unauthorized() {
        let err: HttpError = LarkError::Api {
            operation: "get user info",
            code: 99_991_663,
            message: "invalid access token".to_string(),
        }
        .into();
        assert!(matches!(err, HttpError::AuthenticationFailed(_)));
        assert_eq!(err.message(), "Failed to get user info: invalid access token");
    }
}
