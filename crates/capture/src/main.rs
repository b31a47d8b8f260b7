use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webaudit_capture::config::CaptureConfig;
use webaudit_capture::dispatcher::{CaptureOutcome, Dispatcher};
use webaudit_capture::fallback::DownloadsDir;
use webaudit_capture::notify::{StdoutLauncher, TracingNotifier};
use webaudit_capture::overlay::{OverlayHost, OverlayInput};
use webaudit_capture::page::InProcessPage;
use webaudit_capture::snapshot::FileSnapshotter;
use webaudit_capture::uploader::{DeliveryOutcome, Uploader};
use webaudit_core::selection::SelectorEvent;
use webaudit_core::types::Point;

/// Context id used for the single page driven from the command line.
const CLI_CONTEXT: u64 = 1;

/// Capture an area of a page snapshot and send it to the audit tool.
///
/// The viewport snapshot is read from a PNG file; the selection gesture is
/// replayed through the same overlay state machine the browser uses.
#[derive(Parser, Debug)]
#[command(name = "webaudit-capture")]
#[command(about = "Capture a page area and deliver it to the web audit tool")]
struct Args {
    /// PNG snapshot of the visible viewport
    #[arg(long)]
    viewport: PathBuf,

    /// URL of the page the snapshot was taken from
    #[arg(long)]
    source_url: String,

    /// Drag gesture in CSS pixels, e.g. `100,100:300,250`
    #[arg(long, value_parser = parse_drag, conflicts_with = "full", required_unless_present = "full")]
    drag: Option<(Point, Point)>,

    /// Capture the whole visible viewport instead of an area
    #[arg(long)]
    full: bool,

    /// Device pixel ratio of the page (overrides DEVICE_PIXEL_RATIO)
    #[arg(long)]
    device_pixel_ratio: Option<f64>,

    /// Audit tool URL (overrides AUDIT_TOOL_URL)
    #[arg(long)]
    tool_url: Option<String>,

    /// Fallback download directory (overrides DOWNLOADS_DIR)
    #[arg(long)]
    downloads_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webaudit_capture=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // --- Configuration ---
    let mut config = CaptureConfig::from_env();
    if let Some(ratio) = args.device_pixel_ratio {
        config.device_pixel_ratio = Some(ratio);
    }
    if let Some(url) = args.tool_url {
        config.tool_url = url;
    }
    if let Some(dir) = args.downloads_dir {
        config.downloads_dir = dir;
    }
    tracing::info!(tool_url = %config.tool_url, relay_port = config.relay_port, "Loaded capture configuration");

    // --- Pipeline ---
    let uploader = Uploader::new(
        config.tool_url.clone(),
        config.relay_port,
        Arc::new(DownloadsDir::new(config.downloads_dir.clone())),
        Arc::new(StdoutLauncher),
    );
    let dispatcher = Dispatcher::new(
        Arc::new(FileSnapshotter::new(args.viewport)),
        Arc::new(InProcessPage::new(config.device_pixel_ratio)),
        uploader,
        Arc::new(TracingNotifier),
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let (outcome_tx, outcome_rx) = oneshot::channel();
    let mut outcome_tx = Some(outcome_tx);
    let dispatch = tokio::spawn(dispatcher.run_with(rx, move |outcome| {
        if let Some(reply) = outcome_tx.take() {
            let _ = reply.send(outcome);
        }
    }));

    // --- Gesture ---
    let mut overlay = OverlayHost::new(CLI_CONTEXT, tx);
    overlay.start(args.source_url);

    let event = match args.drag {
        Some((from, to)) => {
            overlay.handle(OverlayInput::PointerDown {
                at: from,
                on_controls: false,
            });
            overlay.handle(OverlayInput::PointerMove(to));
            overlay.handle(OverlayInput::PointerUp(to))
        }
        None => overlay.handle(OverlayInput::VisibleButton),
    };

    if event == SelectorEvent::Discarded {
        tracing::warn!("Selection too small, nothing captured");
    }
    overlay.finish().await;
    // Closing the overlay drops the only sender, which ends the dispatcher.
    drop(overlay);

    dispatch.await.context("capture dispatcher failed")?;
    let Ok(outcome) = outcome_rx.await else {
        bail!("no capture was requested");
    };

    match outcome {
        CaptureOutcome::Completed(DeliveryOutcome::Delivered { filename, .. }) => {
            tracing::info!(%filename, "Capture delivered");
            Ok(())
        }
        CaptureOutcome::Completed(DeliveryOutcome::FallbackSaved { path, .. }) => {
            tracing::info!(path = %path.display(), "Capture saved locally");
            Ok(())
        }
        CaptureOutcome::Completed(DeliveryOutcome::Failed { reason, save_error }) => {
            bail!("upload failed ({reason}) and local save failed ({save_error})")
        }
        CaptureOutcome::Aborted { error, .. } => Err(error).context("capture failed"),
    }
}

/// Parse `X0,Y0:X1,Y1` into the drag's start and end points.
fn parse_drag(value: &str) -> Result<(Point, Point), String> {
    let (from, to) = value
        .split_once(':')
        .ok_or_else(|| format!("expected X0,Y0:X1,Y1, got '{value}'"))?;
    Ok((parse_point(from)?, parse_point(to)?))
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{value}'"))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("invalid x coordinate '{x}'"))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("invalid y coordinate '{y}'"))?;
    Ok(Point::new(x, y))
}
