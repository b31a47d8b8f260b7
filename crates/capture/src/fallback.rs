//! Local fallback persistence.
//!
//! When the relay cannot take a screenshot, the bitmap is encoded as a
//! self-contained `data:` URI and handed to the host's download facility so
//! the user can upload it manually later.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::SaveError;

pub const PNG_MIME: &str = "image/png";

/// Encode bytes as a base64 `data:` URI.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Split a base64 `data:` URI into its media type and decoded payload.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), SaveError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| SaveError::InvalidDataUri("missing 'data:' scheme".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| SaveError::InvalidDataUri("missing ',' separator".into()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| SaveError::InvalidDataUri("only base64 payloads are supported".into()))?;
    Ok((mime.to_string(), STANDARD.decode(payload)?))
}

/// The host's local download facility.
#[async_trait]
pub trait LocalSaver: Send + Sync {
    /// Persist the resource behind `data_uri` under `filename`, returning
    /// where it ended up.
    async fn save(&self, filename: &str, data_uri: &str) -> Result<PathBuf, SaveError>;
}

/// Writes downloads into a directory on disk.
pub struct DownloadsDir {
    dir: PathBuf,
}

impl DownloadsDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl LocalSaver for DownloadsDir {
    async fn save(&self, filename: &str, data_uri: &str) -> Result<PathBuf, SaveError> {
        if !webaudit_core::naming::is_plain_filename(filename) {
            return Err(SaveError::InvalidDataUri(format!(
                "refusing to write outside downloads: {filename}"
            )));
        }
        let (_mime, bytes) = decode_data_uri(data_uri)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(filename);
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!(path = %path.display(), size = bytes.len(), "Saved screenshot to downloads");
        Ok(path)
    }
}
