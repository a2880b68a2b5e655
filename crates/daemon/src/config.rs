//! Configuration management for the larkauth daemon

use crate::{DaemonError, Result};
use config::{Config, Environment, File};
use larkauth_core::logging::LoggingConfig;
use larkauth_http::{FrontendConfig, LarkConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Prefix of nested environment overrides, e.g. `LARKAUTH__SERVER__PORT`
pub const ENV_PREFIX: &str = "LARKAUTH";

type LarkField = fn(&mut LarkConfig) -> &mut String;

/// Flat variables understood for compatibility with existing `.env` files
const FLAT_ENV: [(&str, LarkField); 5] = [
    ("LARK_APP_ID", |c| &mut c.app_id),
    ("LARK_APP_SECRET", |c| &mut c.app_secret),
    ("LARK_API_BASE_URL", |c| &mut c.api_base_url),
    ("LARK_AUTH_BASE_URL", |c| &mut c.auth_base_url),
    ("REDIRECT_URI", |c| &mut c.redirect_uri),
];

/// Daemon settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub lark: LarkConfig,
    pub frontend: FrontendConfig,
    pub logging: LoggingConfig,
}

/// Listener and static file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// API port
    pub port: u16,
    /// Directory holding the built widget
    pub static_dir: PathBuf,
    /// Port of the standalone widget listener
    pub frontend_port: u16,
    /// Run the standalone widget listener
    pub frontend_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8000,
            static_dir: PathBuf::from("static"),
            frontend_port: 3000,
            frontend_enabled: true,
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, &std::env::vars().collect())
    }

    /// Load settings against an explicit environment
    ///
    /// Precedence, lowest first: built-in defaults, flat `LARK_*` variables,
    /// the config file, `LARKAUTH__*` variables.
    pub fn load_with_env(path: Option<&Path>, env: &HashMap<String, String>) -> Result<Self> {
        let mut defaults = Self::default();
        defaults.apply_flat_env(env);

        let mut builder = Config::builder().add_source(Config::try_from(&defaults)?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(Some(env.clone())),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    fn apply_flat_env(&mut self, env: &HashMap<String, String>) {
        for (var, field) in FLAT_ENV {
            let Some(value) = env.get(var).filter(|v| !v.is_empty()) else {
                continue;
            };
            field(&mut self.lark).clone_from(value);
        }
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<()> {
        let missing = self.lark.missing_fields();
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|f| format!("lark.{f}")).collect();
            return Err(DaemonError::ConfigString(format!(
                "missing required settings: {} (set them in the config file, LARK_APP_ID / \
                 LARK_APP_SECRET / REDIRECT_URI, or LARKAUTH__LARK__*)",
                names.join(", ")
            )));
        }

        if self.server.frontend_enabled && self.server.frontend_port == self.server.port {
            return Err(DaemonError::ConfigString(format!(
                "frontend_port and port are both {}",
                self.server.port
            )));
        }

        Ok(())
    }
}
