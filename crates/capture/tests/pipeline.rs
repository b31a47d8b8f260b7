//! End-to-end capture pipeline tests against a live relay.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use common::{serve, spawn_relay, unused_port, Harness};
use serde_json::json;
use tokio::sync::mpsc;

use webaudit_capture::dispatcher::{CaptureOutcome, DispatchSummary, InboundMessage};
use webaudit_capture::error::{CaptureError, UploadError};
use webaudit_capture::notify::NotificationLevel;
use webaudit_capture::uploader::DeliveryOutcome;
use webaudit_core::crop::crop_png;
use webaudit_core::types::{CaptureRequest, ExtensionMessage, SelectionRect};

const SOURCE_URL: &str = "https://site.test/page";

fn area() -> SelectionRect {
    SelectionRect::new(100.0, 100.0, 200.0, 150.0)
}

// ---------------------------------------------------------------------------
// Test: area capture is cropped and stored byte-identical by the relay
// ---------------------------------------------------------------------------

#[tokio::test]
async fn area_capture_is_uploaded_and_opened() {
    let (port, state, uploads) = spawn_relay().await;
    let h = Harness::new(port);

    let outcome = h
        .dispatcher
        .handle(CaptureRequest::area(area(), SOURCE_URL, 1))
        .await;

    let (filename, opened_url) = assert_matches!(
        outcome,
        CaptureOutcome::Completed(DeliveryOutcome::Delivered { filename, opened_url }) => (filename, opened_url)
    );

    let expected = crop_png(&h.viewport, &area(), 1.0).unwrap();
    let stored = std::fs::read(uploads.path().join(&filename)).unwrap();
    assert_eq!(stored, expected);

    let decoded = image::load_from_memory(&stored).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (200, 150));

    let records = state.store.list_recent(10).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].metadata.source_url, SOURCE_URL);
    assert_eq!(records[0].metadata.area, Some(area()));

    let opened = h.launcher.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened_url.as_deref(), Some(opened[0].as_str()));
    assert!(opened[0].contains(&format!("screenshot={filename}")));

    let seen = h.notifier.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].level, NotificationLevel::Success);
    assert_eq!(seen[0].title, "Screenshot Captured");
    assert!(h.downloaded().is_empty());
}

// ---------------------------------------------------------------------------
// Test: full-viewport capture is uploaded unmodified
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_viewport_upload_is_byte_identical() {
    let (port, state, uploads) = spawn_relay().await;
    let h = Harness::new(port);

    let outcome = h
        .dispatcher
        .handle(CaptureRequest::full_viewport(SOURCE_URL, 1))
        .await;

    let filename = assert_matches!(
        outcome,
        CaptureOutcome::Completed(DeliveryOutcome::Delivered { filename, .. }) => filename
    );
    assert_eq!(std::fs::read(uploads.path().join(filename)).unwrap(), h.viewport);
    assert_eq!(state.store.list_recent(10).await[0].metadata.area, None);
}

// ---------------------------------------------------------------------------
// Test: unreachable relay falls back to a local download
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_relay_saves_locally() {
    let port = unused_port().await;
    let h = Harness::new(port);

    let outcome = h
        .dispatcher
        .handle(CaptureRequest::full_viewport(SOURCE_URL, 1))
        .await;

    let (reason, path) = assert_matches!(
        outcome,
        CaptureOutcome::Completed(DeliveryOutcome::FallbackSaved { reason, path }) => (reason, path)
    );
    assert!(reason.is_unreachable());

    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("audit-screenshot-"), "{name}");
    assert!(name.ends_with(".png"));
    assert_eq!(std::fs::read(&path).unwrap(), h.viewport);

    let seen = h.notifier.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].level, NotificationLevel::Warning);
    assert!(seen[0].message.contains("Cannot connect"));
    assert!(seen[0].message.contains(&port.to_string()));
    assert!(h.launcher.opened().is_empty());
}

// ---------------------------------------------------------------------------
// Test: relay error status falls back and reports the status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn relay_error_saves_locally() {
    let app = Router::new().route(
        "/api/screenshot",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let port = serve(app).await;
    let h = Harness::new(port);

    let outcome = h
        .dispatcher
        .handle(CaptureRequest::area(area(), SOURCE_URL, 1))
        .await;

    let reason = assert_matches!(
        outcome,
        CaptureOutcome::Completed(DeliveryOutcome::FallbackSaved { reason, .. }) => reason
    );
    assert_matches!(reason, UploadError::Relay { status: 500, .. });
    assert!(!reason.is_unreachable());

    let seen = h.notifier.seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].message.contains("HTTP 500"), "{}", seen[0].message);
    assert_eq!(h.downloaded().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: the audit tool is opened on the filename the relay reports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn opens_tool_with_reported_filename() {
    let app = Router::new().route(
        "/api/screenshot",
        post(|| async {
            Json(json!({
                "success": true,
                "screenshot": { "filename": "screenshot-123.png" }
            }))
        }),
    );
    let port = serve(app).await;
    let h = Harness::new(port);

    let outcome = h
        .dispatcher
        .handle(CaptureRequest::full_viewport(SOURCE_URL, 1))
        .await;
    assert!(outcome.is_delivered());

    assert_eq!(
        h.launcher.opened(),
        vec![format!(
            "http://127.0.0.1:{}/?screenshot=screenshot-123.png&sourceUrl=https%3A%2F%2Fsite.test%2Fpage",
            common::TOOL_PORT
        )]
    );
}

// ---------------------------------------------------------------------------
// Test: a relay that answers with garbage counts as a failed upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreadable_relay_response_falls_back() {
    let app = Router::new().route("/api/screenshot", post(|| async { "not json" }));
    let port = serve(app).await;
    let h = Harness::new(port);

    let outcome = h
        .dispatcher
        .handle(CaptureRequest::full_viewport(SOURCE_URL, 1))
        .await;

    assert_matches!(
        outcome,
        CaptureOutcome::Completed(DeliveryOutcome::FallbackSaved {
            reason: UploadError::InvalidResponse(_),
            ..
        })
    );
    assert!(h.launcher.opened().is_empty());
}

// ---------------------------------------------------------------------------
// Test: when both upload and local save fail, one generic error is shown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_fallback_notifies_once() {
    let port = unused_port().await;
    let downloads = tempfile::tempdir().unwrap();
    // A regular file where the downloads directory should be.
    let blocked = downloads.path().join("blocked");
    std::fs::write(&blocked, b"").unwrap();
    let h = Harness::with_downloads(port, &blocked, downloads);

    let outcome = h
        .dispatcher
        .handle(CaptureRequest::full_viewport(SOURCE_URL, 1))
        .await;

    assert_matches!(
        outcome,
        CaptureOutcome::Completed(DeliveryOutcome::Failed { .. })
    );
    let seen = h.notifier.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].level, NotificationLevel::Error);
    assert_eq!(seen[0].message, "Failed to save screenshot. Please try again.");
}

// ---------------------------------------------------------------------------
// Test: a snapshot failure aborts without uploading
// ---------------------------------------------------------------------------

#[tokio::test]
async fn snapshot_failure_aborts_capture() {
    use std::sync::Arc;
    use webaudit_capture::dispatcher::Dispatcher;
    use webaudit_capture::fallback::DownloadsDir;
    use webaudit_capture::page::InProcessPage;
    use webaudit_capture::snapshot::FileSnapshotter;
    use webaudit_capture::uploader::Uploader;

    let (port, state, _uploads) = spawn_relay().await;
    let downloads = tempfile::tempdir().unwrap();
    let notifier = Arc::new(common::RecordingNotifier::default());
    let launcher = Arc::new(common::RecordingLauncher::default());
    let dispatcher = Dispatcher::new(
        Arc::new(FileSnapshotter::new(downloads.path().join("missing.png"))),
        Arc::new(InProcessPage::new(None)),
        Uploader::new(Harness::tool_url(), port, Arc::new(DownloadsDir::new(downloads.path())), launcher.clone()),
        notifier.clone(),
    );

    let outcome = dispatcher
        .handle(CaptureRequest::area(area(), SOURCE_URL, 1))
        .await;

    assert_matches!(
        outcome,
        CaptureOutcome::Aborted { error: CaptureError::Snapshot(_), .. }
    );
    let seen = notifier.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].title, "Capture Failed");
    assert_eq!(state.store.count().await, 0);
    assert!(launcher.opened().is_empty());
}

// ---------------------------------------------------------------------------
// Test: undecodable snapshot aborts an area capture
// ---------------------------------------------------------------------------

#[tokio::test]
async fn corrupt_snapshot_aborts_area_capture() {
    use std::sync::Arc;
    use webaudit_capture::dispatcher::Dispatcher;
    use webaudit_capture::fallback::DownloadsDir;
    use webaudit_capture::page::InProcessPage;
    use webaudit_capture::snapshot::FileSnapshotter;
    use webaudit_capture::uploader::Uploader;

    let port = unused_port().await;
    let dir = tempfile::tempdir().unwrap();
    let viewport = dir.path().join("viewport.png");
    std::fs::write(&viewport, b"not a png").unwrap();
    let notifier = Arc::new(common::RecordingNotifier::default());
    let dispatcher = Dispatcher::new(
        Arc::new(FileSnapshotter::new(viewport)),
        Arc::new(InProcessPage::new(None)),
        Uploader::new(
            Harness::tool_url(),
            port,
            Arc::new(DownloadsDir::new(dir.path().join("downloads"))),
            Arc::new(common::RecordingLauncher::default()),
        ),
        notifier.clone(),
    );

    let outcome = dispatcher
        .handle(CaptureRequest::area(area(), SOURCE_URL, 1))
        .await;

    assert_matches!(outcome, CaptureOutcome::Aborted { error: CaptureError::Crop(_), .. });
    assert_eq!(notifier.seen().len(), 1);
    assert!(!dir.path().join("downloads").exists());
}

// ---------------------------------------------------------------------------
// Test: concurrent requests each reach their own terminal outcome
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_handles_every_message() {
    let (port, state, _uploads) = spawn_relay().await;
    let h = Harness::new(port);
    let (tx, rx) = mpsc::unbounded_channel();

    tx.send(InboundMessage {
        context: 1,
        message: ExtensionMessage::CaptureArea {
            area: area(),
            url: "https://a.test".into(),
        },
    })
    .unwrap();
    tx.send(InboundMessage {
        context: 2,
        message: ExtensionMessage::CaptureFullPage {
            url: "https://b.test".into(),
        },
    })
    .unwrap();
    drop(tx);

    let summary = h.dispatcher.clone().run(rx).await;

    assert_eq!(
        summary,
        DispatchSummary {
            finished: 2,
            delivered: 2,
            panicked: 0,
        }
    );
    assert_eq!(h.notifier.seen().len(), 2);
    assert_eq!(state.store.count().await, 2);
}

// ---------------------------------------------------------------------------
// Test: finished captures are reported while the channel is still open
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_reports_outcomes_before_senders_close() {
    let (port, _state, _uploads) = spawn_relay().await;
    let h = Harness::new(port);
    let (tx, rx) = mpsc::unbounded_channel();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    let dispatch = tokio::spawn(h.dispatcher.clone().run_with(rx, move |outcome| {
        let _ = done_tx.send(outcome);
    }));

    for context in 1..=3 {
        tx.send(InboundMessage {
            context,
            message: ExtensionMessage::CaptureFullPage {
                url: format!("https://site.test/{context}"),
            },
        })
        .unwrap();
        let outcome = done_rx.recv().await.unwrap();
        assert!(outcome.is_delivered());
    }

    // The sender is still alive; the dispatcher is only idle.
    assert!(!dispatch.is_finished());

    drop(tx);
    let summary = dispatch.await.unwrap();
    assert_eq!(summary.finished, 3);
    assert_eq!(summary.delivered, 3);
}
