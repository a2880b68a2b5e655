//! Larkauth core types and session handling
//!
//! Everything in here compiles for both native targets and `wasm32`, so the
//! backend and the browser widget agree on one definition of the session
//! record and of when it needs refreshing.

pub mod error;
pub mod session;
pub mod types;

#[cfg(all(feature = "logging", not(target_arch = "wasm32")))]
pub mod logging;

pub use error::{Result, SessionError};
pub use session::{
    AUTH_DATA_KEY, ExistingSession, MemoryStore, RefreshOutcome, RefreshPolicy, SessionCache,
    SessionStore, USER_DATA_KEY,
};
pub use types::{AuthTokens, RefreshTokenRequest, UserProfile, UserSession};
