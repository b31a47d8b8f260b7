#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use webaudit_api::config::{ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
use webaudit_api::router::build_app_router;
use webaudit_api::state::AppState;

pub const BOUNDARY: &str = "webaudit-test-boundary";

/// Build a test `ServerConfig` writing uploads into `uploads`.
pub fn test_config(uploads: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["*".to_string()],
        request_timeout_secs: 30,
        uploads_dir: uploads.path().to_path_buf(),
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
    }
}

/// A relay app plus the temp directory backing its uploads. Keep the
/// directory alive for as long as the app is used.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub uploads: TempDir,
}

/// Build the full application router with all middleware layers.
pub fn build_test_app() -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    build_test_app_with(test_config(&uploads), uploads)
}

pub fn build_test_app_with(config: ServerConfig, uploads: TempDir) -> TestApp {
    let state = AppState::new(config.clone());
    let router = build_app_router(state.clone(), &config);
    TestApp {
        router,
        state,
        uploads,
    }
}

/// Send a GET request.
pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a multipart POST request built from `parts`.
pub async fn post_multipart(app: Router, uri: &str, parts: &[Part<'_>]) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// One multipart form part.
pub enum Part<'a> {
    Text {
        name: &'a str,
        value: &'a str,
    },
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn png_part(data: &[u8]) -> Part<'_> {
    Part::File {
        name: "screenshot",
        filename: "screenshot.png",
        content_type: "image/png",
        data,
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
