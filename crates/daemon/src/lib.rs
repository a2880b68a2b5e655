//! Larkauth daemon: serves the Lark sign-in backend and the widget

pub mod config;
pub mod server;

pub use config::{ServerConfig, Settings};
pub use server::{RunningServer, ServerBuilder};

/// Result type for daemon operations
pub type Result<T> = std::result::Result<T, DaemonError>;

/// Daemon error types
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Configuration error: {0}")]
    ConfigString(String),

    #[error("Lark client error: {0}")]
    Lark(#[from] larkauth_http::services::LarkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP server error: {0}")]
    Http(String),
}
