//! Larkauth HTTP module
//!
//! With the `server` feature this crate provides the Lark OAuth backend: the
//! Open API client, the user store, and the axum routes the widget calls.
//! The `client` feature provides the typed client the widget uses to reach
//! those routes; it builds for `wasm32` as well as native targets.

#[cfg(feature = "server")]
#[macro_use]
extern crate tracing;

pub mod error;

#[cfg(feature = "server")]
pub mod config;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "server")]
pub mod services;
#[cfg(feature = "server")]
pub mod state;
#[cfg(feature = "server")]
pub mod store;

#[cfg(feature = "client")]
pub mod client;

pub use error::{ErrorResponse, HttpError, Result};

#[cfg(feature = "server")]
pub use config::{FrontendConfig, LarkConfig};
#[cfg(feature = "server")]
pub use services::{AuthService, LarkClient};
#[cfg(feature = "server")]
pub use state::AppState;
#[cfg(feature = "server")]
pub use store::{InMemoryUserStore, UserStore};
