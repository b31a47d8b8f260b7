use axum::Json;
use serde::Serialize;

use crate::routes::UPLOAD_ROUTE;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevInfo {
    pub message: &'static str,
    pub note: &'static str,
    pub api_endpoint: &'static str,
}

/// GET / -- points developers at the upload endpoint. The audit tool itself
/// is served separately.
pub async fn dev_info() -> Json<DevInfo> {
    Json(DevInfo {
        message: "Screenshot relay running in development mode",
        note: "The audit tool is served separately on port 8080",
        api_endpoint: UPLOAD_ROUTE,
    })
}
