//! Coedit Realtime Document Server Library
//!
//! Rooms, last-write-wins sync and SQLite persistence behind a single
//! axum HTTP/WebSocket surface.

pub mod config;
pub mod error;
pub mod handlers;
pub mod presence;
pub mod registry;
pub mod session;
pub mod store;
pub mod sync;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tracing::info;

use config::{AppState, ServerConfig};
use store::{DocumentStore, SqliteStore};

/// Build the router on top of prepared state. Split out from [`run`] so
/// tests can drive the exact production surface without binding a port.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Document provisioning
        .route("/api/docs", post(handlers::create_document))
        .route("/api/docs/{id}", get(handlers::get_document))
        // Realtime sync
        .route("/ws", get(session::ws_handler))
        // Health check
        .route("/health", get(health_check));

    if let Some(dir) = state.config.static_dir.clone() {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    info!("=== Coedit Server ===");
    info!("Realtime: WebSocket rooms | Persistence: SQLite | Conflicts: last write wins");

    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(&config.database_path).await?);

    if let Some(dir) = &config.static_dir {
        info!("Serving static assets from {:?}", dir);
    }

    let state = AppState::new(store, config.clone());
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK - Coedit Server"
}
