use webaudit_core::CoreError;

/// Failures before a bitmap is ready for delivery. Always terminal for the
/// capture: reported once, never retried.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The privileged viewport snapshot could not be taken.
    #[error("Viewport snapshot failed: {0}")]
    Snapshot(String),

    /// The page-side cropper rejected the bitmap or the selection.
    #[error("Crop failed: {0}")]
    Crop(#[from] CoreError),

    /// The page context returned nothing usable.
    #[error("Crop returned no image data")]
    MalformedResult,

    /// The crop task died before answering.
    #[error("Crop task failed: {0}")]
    CropTask(#[source] tokio::task::JoinError),
}

/// Delivery failures against the relay.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The upload request could not be assembled.
    #[error("Failed to build upload request: {0}")]
    Request(#[source] reqwest::Error),

    /// The relay could not be reached (DNS, refused connection, timeout).
    #[error("Failed to connect to screenshot relay: {0}")]
    Connect(#[source] reqwest::Error),

    /// The relay answered with a non-2xx status.
    #[error("Screenshot relay returned HTTP {status}: {body}")]
    Relay { status: u16, body: String },

    /// The relay answered 2xx but the body was not the expected JSON.
    #[error("Screenshot relay returned an unreadable response: {0}")]
    InvalidResponse(#[source] reqwest::Error),
}

impl UploadError {
    /// Whether the relay never saw the request.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, UploadError::Connect(_))
    }
}

/// Local fallback persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Failed to write download: {0}")]
    Io(#[from] std::io::Error),
}
