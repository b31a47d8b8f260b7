use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::WsManager;

/// Interval between heartbeat pings.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Spawn a background task that pings every feed subscriber periodically.
///
/// Runs until aborted through the returned handle.
pub fn start_heartbeat(ws_manager: Arc<WsManager>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);

        loop {
            interval.tick().await;
            let count = ws_manager.connection_count().await;
            if count > 0 {
                tracing::debug!(count, "WebSocket heartbeat ping");
                ws_manager.ping_all().await;
            }
        }
    })
}
