use std::sync::Arc;

use crate::config::ServerConfig;
use crate::store::ScreenshotStore;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Relay configuration.
    pub config: Arc<ServerConfig>,
    /// Stored screenshots and their metadata.
    pub store: Arc<ScreenshotStore>,
    /// WebSocket connection manager (audit tool clients).
    pub ws_manager: Arc<WsManager>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let store = ScreenshotStore::new(config.uploads_dir.clone());
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            ws_manager: Arc::new(WsManager::new()),
        }
    }
}
