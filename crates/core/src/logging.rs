//! Subscriber setup for native processes
//!
//! Console output honours `RUST_LOG` first and the configured level second.
//! The optional file layer always records at DEBUG into a daily rolling file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Console filter directive, e.g. `info` or `larkauth_http=debug`
    pub level: String,
    /// Directory for rolling log files
    pub directory: PathBuf,
    /// Write a log file alongside console output
    pub file_enabled: bool,
    /// File name prefix; files are named `{prefix}.{date}.log`
    pub file_prefix: String,
    /// Number of daily files kept before the oldest is removed
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: PathBuf::from("logs"),
            file_enabled: true,
            file_prefix: "larkauth".to_string(),
            max_files: 7,
        }
    }
}

impl LoggingConfig {
    /// Build the daily rolling appender described by this config
    pub fn file_appender(&self) -> Result<RollingFileAppender> {
        std::fs::create_dir_all(&self.directory).with_context(|| {
            format!(
                "Failed to create log directory {}",
                self.directory.display()
            )
        })?;

        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(&self.file_prefix)
            .filename_suffix("log")
            .max_log_files(self.max_files)
            .build(&self.directory)
            .context("Failed to create rolling log file")
    }
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(env_filter);

    let (file_layer, guard) = if config.file_enabled {
        let (writer, guard) = tracing_appender::non_blocking(config.file_appender()?);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_filter(LevelFilter::DEBUG);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if config.file_enabled {
        tracing::debug!(directory = %config.directory.display(), "File logging enabled");
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.directory, PathBuf::from("logs"));
        assert!(config.file_enabled);
        assert_eq!(config.max_files, 7);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: LoggingConfig = serde_json::from_str(r#"{"level":"debug"}"#).unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.file_prefix, "larkauth");
    }

    #[test]
    fn test_file_appender_creates_directory() {
        let temp = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            directory: temp.path().join("nested").join("logs"),
            ..LoggingConfig::default()
        };

        config.file_appender().unwrap();
        assert!(config.directory.is_dir());
    }
}
