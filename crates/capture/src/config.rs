use std::path::PathBuf;

use webaudit_core::endpoint::{DEFAULT_RELAY_PORT, DEFAULT_TOOL_URL};

/// Capture-side configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local audit tool on port 8080
/// with its relay on 8081.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// URL of the audit tool the user connected to.
    pub tool_url: String,
    /// Port the relay API listens on, on the tool's host.
    pub relay_port: u16,
    /// Where fallback downloads are written.
    pub downloads_dir: PathBuf,
    /// Device pixel ratio reported by the page, if known.
    pub device_pixel_ratio: Option<f64>,
}

impl CaptureConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                 |
    /// |----------------------|-------------------------|
    /// | `AUDIT_TOOL_URL`     | `http://localhost:8080` |
    /// | `RELAY_PORT`         | `8081`                  |
    /// | `DOWNLOADS_DIR`      | `downloads`             |
    /// | `DEVICE_PIXEL_RATIO` | unset (treated as 1)    |
    pub fn from_env() -> Self {
        let tool_url = std::env::var("AUDIT_TOOL_URL").unwrap_or_else(|_| DEFAULT_TOOL_URL.into());

        let relay_port: u16 = std::env::var("RELAY_PORT")
            .unwrap_or_else(|_| DEFAULT_RELAY_PORT.to_string())
            .parse()
            .expect("RELAY_PORT must be a valid u16");

        let downloads_dir = std::env::var("DOWNLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("downloads"));

        let device_pixel_ratio = std::env::var("DEVICE_PIXEL_RATIO").ok().map(|v| {
            v.parse::<f64>()
                .expect("DEVICE_PIXEL_RATIO must be a number")
        });

        Self {
            tool_url,
            relay_port,
            downloads_dir,
            device_pixel_ratio,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            tool_url: DEFAULT_TOOL_URL.to_string(),
            relay_port: DEFAULT_RELAY_PORT,
            downloads_dir: PathBuf::from("downloads"),
            device_pixel_ratio: None,
        }
    }
}
