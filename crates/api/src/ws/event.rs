use serde::Serialize;

use crate::store::ScreenshotRecord;

/// Event pushed to every feed subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ScreenshotEvent {
    #[serde(rename = "screenshot.created")]
    Created { screenshot: ScreenshotRecord },
}

impl ScreenshotEvent {
    pub fn created(screenshot: ScreenshotRecord) -> Self {
        Self::Created { screenshot }
    }
}
