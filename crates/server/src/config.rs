//! Server configuration and shared application state.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::presence::PresenceRelay;
use crate::registry::RoomRegistry;
use crate::store::DocumentStore;
use crate::sync::SyncEngine;

/// Configuration for the coedit server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_addr: SocketAddr,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Optional directory of static assets (the editor frontend)
    pub static_dir: Option<PathBuf>,
    /// How often each session pings its client
    pub probe_interval: Duration,
    /// How many probe intervals a client may stay silent before it is reaped
    pub probe_tolerance: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_path: PathBuf::from("coedit.sqlite"),
            static_dir: None,
            probe_interval: Duration::from_secs(30),
            probe_tolerance: 1,
        }
    }
}

impl ServerConfig {
    /// Build a config from environment variables, falling back to defaults.
    /// Recognized: `PORT`, `COEDIT_DB`, `COEDIT_STATIC_DIR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            config.bind_addr.set_port(port);
        }
        if let Ok(path) = std::env::var("COEDIT_DB") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("COEDIT_STATIC_DIR") {
            config.static_dir = Some(PathBuf::from(dir));
        }
        config
    }

    /// Silence budget before a session is reaped: the probe interval plus
    /// one full interval of grace per tolerated miss.
    pub fn liveness_timeout(&self) -> Duration {
        self.probe_interval * (self.probe_tolerance + 1)
    }
}

/// App state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub registry: Arc<RoomRegistry>,
    pub engine: Arc<SyncEngine>,
    pub presence: Arc<PresenceRelay>,
    pub config: ServerConfig,
}

impl AppState {
    /// Wire up the full state graph on top of a store.
    pub fn new(store: Arc<dyn DocumentStore>, config: ServerConfig) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let engine = Arc::new(SyncEngine::new(store.clone(), registry.clone()));
        let presence = Arc::new(PresenceRelay::new(registry.clone()));
        Self {
            store,
            registry,
            engine,
            presence,
            config,
        }
    }
}
