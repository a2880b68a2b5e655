//! Backend services

pub mod auth;
pub mod lark;

pub use auth::AuthService;
pub use lark::{LarkClient, LarkError};
