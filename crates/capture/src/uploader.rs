//! Delivery of finished screenshots to the relay.
//!
//! Stages are strictly ordered and each is terminal for the capture:
//! network delivery, then local save, then notify-only. Nothing is retried
//! and a stage never undoes what an earlier one did.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use webaudit_core::endpoint;
use webaudit_core::naming::fallback_filename;
use webaudit_core::types::SelectionRect;

use crate::error::{SaveError, UploadError};
use crate::fallback::{encode_data_uri, LocalSaver, PNG_MIME};
use crate::notify::{AppLauncher, Notification, NotificationLevel};

/// Multipart file name used for every upload.
const UPLOAD_FILE_NAME: &str = "screenshot.png";

/// A finished bitmap plus the metadata the relay stores with it.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub bitmap: Vec<u8>,
    pub source_url: String,
    pub area: Option<SelectionRect>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    screenshot: StoredScreenshot,
}

#[derive(Debug, Deserialize)]
struct StoredScreenshot {
    filename: String,
}

/// Terminal result of a delivery attempt.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// The relay stored the screenshot.
    Delivered {
        filename: String,
        /// URL the consuming app was opened with, if one could be built.
        opened_url: Option<String>,
    },
    /// The relay failed; the bitmap was saved locally instead.
    FallbackSaved { reason: UploadError, path: PathBuf },
    /// Both the relay and the local save failed.
    Failed {
        reason: UploadError,
        save_error: SaveError,
    },
}

impl DeliveryOutcome {
    /// The one notification shown for this outcome.
    pub fn notification(&self, relay_port: u16) -> Notification {
        match self {
            DeliveryOutcome::Delivered { .. } => Notification::new(
                NotificationLevel::Success,
                "Screenshot Captured",
                "Screenshot uploaded and opened in audit tool!",
            ),
            DeliveryOutcome::FallbackSaved { reason, .. } => Notification::new(
                NotificationLevel::Warning,
                "Upload Failed",
                format!(
                    "{} Screenshot saved to downloads instead; upload it manually to the audit tool.",
                    describe_upload_error(reason, relay_port)
                ),
            ),
            DeliveryOutcome::Failed { .. } => Notification::new(
                NotificationLevel::Error,
                "Error",
                "Failed to save screenshot. Please try again.",
            ),
        }
    }
}

/// Short user-facing reason distinguishing "relay down" from "relay broke".
pub fn describe_upload_error(err: &UploadError, relay_port: u16) -> String {
    match err {
        UploadError::Connect(_) => {
            format!("Cannot connect to the screenshot relay. Is it running on port {relay_port}?")
        }
        UploadError::Relay { status, .. } => {
            format!("Screenshot relay error (HTTP {status}).")
        }
        UploadError::InvalidResponse(_) => {
            "Screenshot relay returned an unreadable response.".to_string()
        }
        UploadError::Request(_) => "Failed to upload screenshot.".to_string(),
    }
}

/// Sends screenshots to the relay derived from the configured tool URL.
#[derive(Clone)]
pub struct Uploader {
    client: reqwest::Client,
    tool_url: String,
    api_base: String,
    relay_port: u16,
    saver: Arc<dyn LocalSaver>,
    launcher: Arc<dyn AppLauncher>,
}

impl Uploader {
    pub fn new(
        tool_url: impl Into<String>,
        relay_port: u16,
        saver: Arc<dyn LocalSaver>,
        launcher: Arc<dyn AppLauncher>,
    ) -> Self {
        let tool_url = tool_url.into();
        let api_base = endpoint::resolve_api_base(&tool_url, relay_port);
        Self {
            client: reqwest::Client::new(),
            tool_url,
            api_base,
            relay_port,
            saver,
            launcher,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn relay_port(&self) -> u16 {
        self.relay_port
    }

    /// Deliver `payload`, falling back to a local download on failure.
    pub async fn deliver(&self, payload: UploadPayload) -> DeliveryOutcome {
        let reason = match self.upload(&payload).await {
            Ok(filename) => {
                let opened_url = self.open_app(&filename, &payload.source_url).await;
                tracing::info!(%filename, "Screenshot uploaded");
                return DeliveryOutcome::Delivered {
                    filename,
                    opened_url,
                };
            }
            Err(e) => e,
        };

        tracing::warn!(api_base = %self.api_base, error = %reason, "Upload failed, saving locally");

        let data_uri = encode_data_uri(PNG_MIME, &payload.bitmap);
        let filename = fallback_filename(chrono::Utc::now());
        match self.saver.save(&filename, &data_uri).await {
            Ok(path) => DeliveryOutcome::FallbackSaved { reason, path },
            Err(save_error) => {
                tracing::error!(error = %save_error, "Failed to save screenshot locally");
                DeliveryOutcome::Failed { reason, save_error }
            }
        }
    }

    /// POST the payload and return the filename the relay stored it under.
    async fn upload(&self, payload: &UploadPayload) -> Result<String, UploadError> {
        let file = Part::bytes(payload.bitmap.clone())
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(PNG_MIME)
            .map_err(UploadError::Request)?;

        let mut form = Form::new()
            .part("screenshot", file)
            .text("url", payload.source_url.clone());
        if let Some(area) = &payload.area {
            // Serializing plain f64 fields cannot fail.
            let area_json = serde_json::to_string(area).unwrap_or_default();
            form = form.text("area", area_json);
        }

        let url = endpoint::upload_url(&self.api_base);
        tracing::debug!(%url, size = payload.bitmap.len(), "Uploading screenshot");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(UploadError::Connect)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(UploadError::Relay {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(UploadError::InvalidResponse)?;
        Ok(parsed.screenshot.filename)
    }

    async fn open_app(&self, filename: &str, source_url: &str) -> Option<String> {
        match endpoint::open_url(&self.tool_url, filename, source_url) {
            Ok(url) => {
                self.launcher.open(&url).await;
                Some(url)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot open audit tool for uploaded screenshot");
                None
            }
        }
    }
}
