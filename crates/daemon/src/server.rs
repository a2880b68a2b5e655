//! Server setup and lifecycle

use crate::config::Settings;
use crate::{DaemonError, Result};
use axum::Router;
use larkauth_http::{AppState, AuthService, InMemoryUserStore, LarkClient};
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_status::SetStatus;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as _};

/// Server configuration builder
pub struct ServerBuilder {
    settings: Settings,
}

impl ServerBuilder {
    /// Create a new server builder
    pub const fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Build the shared handler state
    pub fn build_app_state(&self) -> Result<AppState> {
        let lark = LarkClient::new(self.settings.lark.clone())?;
        let store = Arc::new(InMemoryUserStore::new());
        let auth_service = Arc::new(AuthService::new(lark, store));
        Ok(AppState::new(auth_service, &self.settings.frontend))
    }

    /// Build the API router
    pub fn build_router() -> OpenApiRouter<AppState> {
        larkauth_http::routes::router()
    }

    /// Build the complete axum router with documentation and `/static`
    pub fn build_axum_router(
        router: OpenApiRouter<AppState>,
        state: AppState,
        static_dir: Option<&Path>,
    ) -> Router {
        let (router, api) = router.split_for_parts();

        // Docs at /docs/
        let mut router = router.merge(Scalar::with_url("/docs/", api));

        if let Some(static_dir) = static_dir {
            if static_dir.is_dir() {
                info!("Serving static files from: {}", static_dir.display());
                router = router.nest_service("/static", widget_service(static_dir));
            } else {
                warn!(
                    "Static directory '{}' does not exist, skipping static file serving",
                    static_dir.display()
                );
            }
        }

        router
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Router for the standalone widget listener
    pub fn build_frontend_router(static_dir: &Path) -> Option<Router> {
        if !static_dir.is_dir() {
            warn!(
                "Static directory '{}' does not exist, frontend listener disabled",
                static_dir.display()
            );
            return None;
        }

        Some(
            Router::new()
                .fallback_service(widget_service(static_dir))
                .layer(TraceLayer::new_for_http()),
        )
    }

    /// Build the API router from settings
    pub fn build(&self) -> Result<Router> {
        let state = self.build_app_state()?;
        Ok(Self::build_axum_router(
            Self::build_router(),
            state,
            Some(&self.settings.server.static_dir),
        ))
    }

    /// Bind the listeners and start serving in the background
    pub async fn start(self) -> Result<RunningServer> {
        let server = &self.settings.server;
        let api_router = self.build()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        let api_listener = bind(&server.host, server.port).await?;
        let api_addr = api_listener.local_addr()?;
        info!("API server listening on http://{api_addr}");
        info!("API docs at http://{api_addr}/docs/");
        tasks.push(tokio::spawn(serve(
            api_listener,
            api_router,
            wait_for_shutdown(shutdown_rx.clone()),
        )));

        let mut frontend_addr = None;
        if server.frontend_enabled {
            if let Some(router) = Self::build_frontend_router(&server.static_dir) {
                let listener = bind(&server.host, server.frontend_port).await?;
                let addr = listener.local_addr()?;
                info!("Frontend listening on http://{addr}");
                tasks.push(tokio::spawn(serve(
                    listener,
                    router,
                    wait_for_shutdown(shutdown_rx),
                )));
                frontend_addr = Some(addr);
            }
        }

        Ok(RunningServer {
            api_addr,
            frontend_addr,
            shutdown: shutdown_tx,
            tasks,
        })
    }
}

/// Widget files with `index.html` fallback so client-side routes resolve
fn widget_service(static_dir: &Path) -> ServeDir<SetStatus<ServeFile>> {
    let index = static_dir.join("index.html");
    debug!("Index file path: {}", index.display());
    ServeDir::new(static_dir).not_found_service(ServeFile::new(index))
}

async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .map_err(|e| DaemonError::Http(format!("Failed to bind to {host}:{port}: {e}")))
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

/// Serve `router` until `shutdown` resolves, then drain open connections
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| DaemonError::Http(format!("HTTP server error: {e}")))
}

/// Listeners started by [`ServerBuilder::start`]
pub struct RunningServer {
    pub api_addr: SocketAddr,
    pub frontend_addr: Option<SocketAddr>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<Result<()>>>,
}

impl RunningServer {
    /// Signal every listener to stop and wait for them to drain
    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down");
        // Receivers may already be gone if a listener failed
        let _ = self.shutdown.send(true);

        for task in self.tasks {
            task.await
                .map_err(|e| DaemonError::Http(format!("server task failed: {e}")))??;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
