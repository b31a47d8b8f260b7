//! Screenshot storage.
//!
//! Files live in the uploads directory; their metadata is kept in memory
//! for the lifetime of the process, in upload order.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::RwLock;
use webaudit_core::naming::{is_plain_filename, stored_screenshot_filename};
use webaudit_core::types::{SelectionRect, Timestamp};

/// Number of records returned by the listing endpoint.
pub const RECENT_LIMIT: usize = 10;

/// Public URL prefix the uploads directory is served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Metadata submitted alongside an upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotMetadata {
    pub source_url: String,
    pub area: Option<SelectionRect>,
    pub timestamp: Timestamp,
}

/// One stored screenshot, as reported to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenshotRecord {
    pub filename: String,
    pub url: String,
    pub size: usize,
    pub metadata: ScreenshotMetadata,
}

pub struct ScreenshotStore {
    dir: PathBuf,
    records: RwLock<Vec<ScreenshotRecord>>,
}

impl ScreenshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the uploads directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Write `bytes` under a fresh name and record the metadata.
    pub async fn save(
        &self,
        bytes: &[u8],
        source_url: String,
        area: Option<SelectionRect>,
    ) -> io::Result<ScreenshotRecord> {
        let now = chrono::Utc::now();
        let filename = stored_screenshot_filename(now);

        self.ensure_dir().await?;
        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        let record = ScreenshotRecord {
            url: format!("{UPLOADS_ROUTE}/{filename}"),
            filename,
            size: bytes.len(),
            metadata: ScreenshotMetadata {
                source_url,
                area,
                timestamp: now,
            },
        };
        self.records.write().await.push(record.clone());
        tracing::info!(filename = %record.filename, size = record.size, "Screenshot stored");
        Ok(record)
    }

    /// The last `limit` records, oldest first.
    pub async fn list_recent(&self, limit: usize) -> Vec<ScreenshotRecord> {
        let records = self.records.read().await;
        let start = records.len().saturating_sub(limit);
        records[start..].to_vec()
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Read a stored file. `Ok(None)` when the name is not a plain filename
    /// or nothing is stored under it.
    pub async fn read(&self, filename: &str) -> io::Result<Option<Vec<u8>>> {
        if !is_plain_filename(filename) {
            return Ok(None);
        }
        match tokio::fs::read(self.dir.join(filename)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
