//! Privileged viewport snapshot source.

use std::path::PathBuf;

use async_trait::async_trait;
use webaudit_core::types::ContextId;

use crate::error::CaptureError;

/// Takes a PNG snapshot of the visible viewport of a page context.
///
/// Implementations must be reentrant: concurrent captures call this without
/// any coordination.
#[async_trait]
pub trait Snapshotter: Send + Sync {
    async fn capture_viewport(&self, context: ContextId) -> Result<Vec<u8>, CaptureError>;
}

/// Serves a viewport image that was already rendered to disk.
pub struct FileSnapshotter {
    path: PathBuf,
}

impl FileSnapshotter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Snapshotter for FileSnapshotter {
    async fn capture_viewport(&self, context: ContextId) -> Result<Vec<u8>, CaptureError> {
        tracing::debug!(context, path = %self.path.display(), "Reading viewport snapshot");
        tokio::fs::read(&self.path).await.map_err(|e| {
            CaptureError::Snapshot(format!("{}: {e}", self.path.display()))
        })
    }
}
