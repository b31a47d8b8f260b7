#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use image::{ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;

use webaudit_api::config::{ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
use webaudit_api::router::build_app_router;
use webaudit_api::state::AppState;
use webaudit_capture::dispatcher::Dispatcher;
use webaudit_capture::fallback::DownloadsDir;
use webaudit_capture::notify::{AppLauncher, Notification, Notifier};
use webaudit_capture::page::InProcessPage;
use webaudit_capture::snapshot::FileSnapshotter;
use webaudit_capture::uploader::Uploader;

/// Port the audit tool itself is configured on; only its host matters.
pub const TOOL_PORT: u16 = 8080;

/// Notifier that keeps everything it was asked to show.
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn seen(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

/// Launcher that records the URLs it was asked to open.
#[derive(Default)]
pub struct RecordingLauncher {
    opened: Mutex<Vec<String>>,
}

impl RecordingLauncher {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppLauncher for RecordingLauncher {
    async fn open(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}

/// Serve `app` on an ephemeral local port.
pub async fn serve(app: Router) -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    port
}

/// Start the real relay; uploads land in the returned directory.
pub async fn spawn_relay() -> (u16, AppState, TempDir) {
    let uploads = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["*".to_string()],
        request_timeout_secs: 30,
        uploads_dir: uploads.path().to_path_buf(),
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
    };
    let state = AppState::new(config.clone());
    let port = serve(build_app_router(state.clone(), &config)).await;
    (port, state, uploads)
}

/// A port nothing listens on.
pub async fn unused_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    addr.port()
}

/// A 400x300 viewport where every pixel encodes its own coordinates.
pub fn viewport_png() -> Vec<u8> {
    let img = RgbaImage::from_fn(400, 300, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 7, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Everything a capture test needs, wired the way the CLI wires it.
pub struct Harness {
    pub dispatcher: Dispatcher,
    pub notifier: Arc<RecordingNotifier>,
    pub launcher: Arc<RecordingLauncher>,
    pub viewport: Vec<u8>,
    pub relay_port: u16,
    pub downloads: TempDir,
    _viewport_dir: TempDir,
}

impl Harness {
    pub fn tool_url() -> String {
        format!("http://127.0.0.1:{TOOL_PORT}/")
    }

    pub fn new(relay_port: u16) -> Self {
        let downloads = tempfile::tempdir().unwrap();
        Self::with_downloads(relay_port, downloads.path().to_path_buf(), downloads)
    }

    /// Use `downloads_path` for fallback saves instead of the temp dir.
    pub fn with_downloads(relay_port: u16, downloads_path: impl AsRef<Path>, downloads: TempDir) -> Self {
        let viewport_dir = tempfile::tempdir().unwrap();
        let viewport = viewport_png();
        let viewport_path = viewport_dir.path().join("viewport.png");
        std::fs::write(&viewport_path, &viewport).unwrap();

        let notifier = Arc::new(RecordingNotifier::default());
        let launcher = Arc::new(RecordingLauncher::default());
        let uploader = Uploader::new(
            Self::tool_url(),
            relay_port,
            Arc::new(DownloadsDir::new(downloads_path.as_ref())),
            launcher.clone(),
        );
        let dispatcher = Dispatcher::new(
            Arc::new(FileSnapshotter::new(viewport_path)),
            Arc::new(InProcessPage::new(None)),
            uploader,
            notifier.clone(),
        );

        Self {
            dispatcher,
            notifier,
            launcher,
            viewport,
            relay_port,
            downloads,
            _viewport_dir: viewport_dir,
        }
    }

    /// Files written to the downloads directory.
    pub fn downloaded(&self) -> Vec<std::path::PathBuf> {
        match std::fs::read_dir(self.downloads.path()) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}
