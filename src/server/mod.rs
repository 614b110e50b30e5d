// src/server/mod.rs

//! Dev HTTP server.
//!
//! Serves the dev output and source trees, injects the live-reload client
//! into HTML pages and pushes [`ReloadMessage`](crate::reload::ReloadMessage)s
//! to browsers over server-sent events.

pub mod handlers;
pub mod inject;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::{ServerSection, TemplateVars};
use crate::reload::ReloadBridge;

pub use inject::{CLIENT_SCRIPT_PATH, EVENTS_PATH};

/// Configuration for the dev server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    pub host: String,
    pub port: u16,
    /// Directories searched in order for each request.
    pub base_dirs: Vec<PathBuf>,
}

impl DevServerConfig {
    /// Resolve `[server]` against the current mode's placeholders. Relative
    /// base directories are taken from `project_root`.
    pub fn from_section(section: &ServerSection, vars: &TemplateVars, project_root: &Path) -> Self {
        Self {
            host: section.host.clone(),
            port: section.port,
            base_dirs: section
                .base_dirs
                .iter()
                .map(|d| project_root.join(vars.render(d)))
                .collect(),
        }
    }
}

/// Shared state for handlers.
#[derive(Debug, Clone)]
pub struct DevServerState {
    pub base_dirs: Arc<Vec<PathBuf>>,
    pub reload: ReloadBridge,
}

impl DevServerState {
    pub fn new(base_dirs: Vec<PathBuf>, reload: ReloadBridge) -> Self {
        Self {
            base_dirs: Arc::new(base_dirs),
            reload,
        }
    }
}

/// A running dev server.
#[derive(Debug)]
pub struct DevServerHandle {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl DevServerHandle {
    /// Address actually bound (useful with port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Build the dev server router.
pub fn build_router(state: DevServerState) -> Router {
    Router::new()
        .route(CLIENT_SCRIPT_PATH, get(handlers::client_script))
        .route(EVENTS_PATH, get(handlers::events))
        .fallback(handlers::serve_static)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and spawn the dev server. It runs until the handle is aborted or the
/// process exits.
pub async fn start_server(
    config: DevServerConfig,
    reload: ReloadBridge,
) -> std::io::Result<DevServerHandle> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, base_dirs = ?config.base_dirs, "dev server listening on http://{addr}");

    let router = build_router(DevServerState::new(config.base_dirs, reload));
    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "dev server error");
        }
    });

    Ok(DevServerHandle { addr, task })
}
