use anyhow::{Context, Result};
use clap::Parser;
use larkauth_core::logging::init_tracing;
use larkauth_daemon::{ServerBuilder, Settings};
use std::path::PathBuf;
use tracing::info;

/// Larkauth - Lark sign-in backend and widget server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML or YAML)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Host to bind both listeners to
    #[arg(long)]
    host: Option<String>,

    /// API port
    #[arg(short, long)]
    port: Option<u16>,

    /// Widget port
    #[arg(long)]
    frontend_port: Option<u16>,

    /// Only run the API listener
    #[arg(long)]
    no_frontend: bool,

    /// Directory holding the built widget
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Console log filter, e.g. `debug` or `larkauth_http=trace`
    #[arg(long)]
    log_level: Option<String>,

    /// Disable the rolling log file
    #[arg(long)]
    no_file_log: bool,
}

impl Cli {
    fn apply(self, settings: &mut Settings) {
        if let Some(host) = self.host {
            settings.server.host = host;
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(port) = self.frontend_port {
            settings.server.frontend_port = port;
        }
        if self.no_frontend {
            settings.server.frontend_enabled = false;
        }
        if let Some(dir) = self.static_dir {
            settings.server.static_dir = dir;
        }
        if let Some(level) = self.log_level {
            settings.logging.level = level;
        }
        if self.no_file_log {
            settings.logging.file_enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli_config = cli.config.clone();
    let mut settings = Settings::load(cli_config.as_deref()).context("Failed to load settings")?;
    cli.apply(&mut settings);

    let _log_guard = init_tracing(&settings.logging)?;
    if let Some(path) = &cli_config {
        info!("Loaded configuration from: {}", path.display());
    }
    settings.validate()?;

    let running = ServerBuilder::new(settings).start().await?;

    println!("API server running at: http://{}/", running.api_addr);
    println!("API docs at: http://{}/docs/", running.api_addr);
    if let Some(addr) = running.frontend_addr {
        println!("Frontend running at: http://{addr}/");
    }

    // Wait for Ctrl+C
    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    running.shutdown().await?;
    Ok(())
}
