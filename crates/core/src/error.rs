//! Session error types

use thiserror::Error;

/// Errors raised while reading or writing the cached session
#[derive(Debug, Error)]
pub enum SessionError {
    /// The underlying key/value store refused the operation
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored record exists but cannot be parsed
    #[error("Corrupt session record '{key}': {message}")]
    Corrupt { key: &'static str, message: String },

    /// A record could not be serialized for storage
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Whether this error means the cached record is unreadable
    pub const fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// Result type alias using SessionError
pub type Result<T> = std::result::Result<T, SessionError>;
