use axum::routing::{get, post};
use axum::Router;

use crate::handlers::screenshots;
use crate::state::AppState;

/// Screenshot upload and retrieval, mounted under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/screenshot", post(screenshots::upload_screenshot))
        .route("/screenshots", get(screenshots::list_screenshots))
        .route("/screenshots/{filename}", get(screenshots::get_screenshot))
}
