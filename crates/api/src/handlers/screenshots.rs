use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use webaudit_core::types::SelectionRect;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::store::{ScreenshotRecord, RECENT_LIMIT};
use crate::ws::ScreenshotEvent;

/// Response body for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub screenshot: ScreenshotRecord,
}

/// Response body for the recent-screenshots listing.
#[derive(Debug, Serialize)]
pub struct ScreenshotList {
    pub screenshots: Vec<ScreenshotRecord>,
}

/// POST /api/screenshot
///
/// Accepts a multipart upload with a `screenshot` image file, the page `url`
/// it was taken from and an optional JSON `area`.
pub async fn upload_screenshot(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let max_bytes = state.config.max_upload_bytes;

    let mut file: Option<Bytes> = None;
    let mut source_url = String::new();
    let mut area_json: Option<String> = None;

    let rejected = |err| multipart_error(err, max_bytes);

    while let Some(field) = multipart.next_field().await.map_err(rejected)? {
        match field.name() {
            Some("screenshot") => file = Some(read_image(field, max_bytes).await?),
            Some("url") => source_url = field.text().await.map_err(rejected)?,
            Some("area") => area_json = Some(field.text().await.map_err(rejected)?),
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown multipart field");
            }
        }
    }

    let file = file.ok_or_else(|| AppError::BadRequest("No screenshot file provided".into()))?;
    let area = parse_area(area_json.as_deref())?;

    let record = state
        .store
        .save(&file, source_url, area)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store screenshot: {e}")))?;

    state
        .ws_manager
        .broadcast_event(&ScreenshotEvent::created(record.clone()))
        .await;

    Ok(Json(UploadResponse {
        success: true,
        screenshot: record,
    }))
}

/// GET /api/screenshots
pub async fn list_screenshots(State(state): State<AppState>) -> Json<ScreenshotList> {
    Json(ScreenshotList {
        screenshots: state.store.list_recent(RECENT_LIMIT).await,
    })
}

/// GET /api/screenshots/{filename}
pub async fn get_screenshot(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<impl IntoResponse> {
    let bytes = state
        .store
        .read(&filename)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to read {filename}: {e}")))?
        .ok_or_else(|| AppError::NotFound("Screenshot not found".into()))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}

async fn read_image(field: Field<'_>, max_bytes: usize) -> AppResult<Bytes> {
    let is_image = field
        .content_type()
        .is_some_and(|ct| ct.starts_with("image/"));
    if !is_image {
        return Err(AppError::BadRequest("Only image files are allowed".into()));
    }

    let bytes = field
        .bytes()
        .await
        .map_err(|err| multipart_error(err, max_bytes))?;
    if bytes.len() > max_bytes {
        return Err(AppError::FileTooLarge { max_bytes });
    }
    Ok(bytes)
}

/// Parse the optional `area` field. An empty field or JSON `null` means no area.
fn parse_area(raw: Option<&str>) -> AppResult<Option<SelectionRect>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let area: Option<SelectionRect> = serde_json::from_str(raw)
        .map_err(|e| AppError::BadRequest(format!("Invalid area: {e}")))?;
    if let Some(area) = &area {
        area.validate()?;
    }
    Ok(area)
}

/// Body-limit rejections surface as multipart errors; report them as the
/// size error the client expects.
fn multipart_error(err: MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileTooLarge { max_bytes }
    } else {
        AppError::BadRequest(err.body_text())
    }
}
