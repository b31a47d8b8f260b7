pub mod health;
pub mod screenshots;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Path the capture side posts screenshots to.
pub const UPLOAD_ROUTE: &str = "/api/screenshot";

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                       relay status
/// /screenshot                   upload (POST)
/// /screenshots                  recent uploads
/// /screenshots/{filename}       raw stored file
/// /ws                           screenshot feed (WebSocket)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(screenshots::router())
        .route("/ws", get(ws::ws_handler))
}

/// Root-level development info.
pub fn root_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::info::dev_info))
}
