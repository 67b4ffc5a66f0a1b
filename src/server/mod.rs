//! HTTP surface: the editor page, static assets and the `/api` endpoints.

pub mod handlers;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    advisor::Advisor,
    config::Config,
    execution::Gateway,
    llm::{ChatOptions, LlmClient},
    messages::Messages,
    store::DocumentStore,
};

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub store: Arc<DocumentStore>,
    pub advisor: Arc<Advisor>,
    pub messages: Messages,
}

impl AppState {
    pub fn new(
        gateway: Gateway,
        store: DocumentStore,
        advisor: Advisor,
        messages: Messages,
    ) -> Self {
        Self {
            gateway: Arc::new(gateway),
            store: Arc::new(store),
            advisor: Arc::new(advisor),
            messages,
        }
    }

    /// Build every component from the startup config. Creates the store
    /// directory. A missing chat credential only disables chat.
    pub async fn from_config(cfg: &Config) -> Result<Self> {
        let messages = Messages::new(cfg.locale());
        let store = DocumentStore::open(cfg.store_path())
            .await
            .with_context(|| format!("creating store at {}", cfg.store_path().display()))?;

        let client = match LlmClient::from_config(cfg) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("advisory chat disabled: {}", e);
                None
            }
        };
        let advisor = Advisor::new(client, ChatOptions::from_config(cfg), messages);

        Ok(Self::new(Gateway::from_config(cfg), store, advisor, messages))
    }
}

pub struct Assets {
    pub index: PathBuf,
    pub static_dir: PathBuf,
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/execute", post(handlers::execute))
        .route("/api/save", post(handlers::save))
        .route("/api/load", post(handlers::load))
        .route("/api/files", get(handlers::list_files))
        .route("/api/chat", post(handlers::chat))
        .with_state(state)
}

pub fn create_app(state: AppState, assets: &Assets) -> Router {
    api_router(state)
        .route_service("/", ServeFile::new(&assets.index))
        .nest_service("/static", ServeDir::new(&assets.static_dir))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("leanpad listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
