//! Capture dispatcher.
//!
//! Bridges page-level capture messages into the privileged snapshot API and
//! routes the result: area captures go through the originating page's
//! cropper, full-viewport captures go straight to the uploader. Each request
//! runs as its own task; nothing is queued, coalesced or locked across
//! requests.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use webaudit_core::types::{CaptureKind, CaptureRequest, ContextId, ExtensionMessage};

use crate::error::CaptureError;
use crate::notify::{Notification, NotificationLevel, Notifier};
use crate::page::{CropJob, PageExecutor};
use crate::snapshot::Snapshotter;
use crate::uploader::{DeliveryOutcome, UploadPayload, Uploader};

/// A message from a page together with the context it came from.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub context: ContextId,
    pub message: ExtensionMessage,
}

/// Terminal result of one capture request.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// A bitmap was produced and handed to the uploader.
    Completed(DeliveryOutcome),
    /// Snapshot or crop failed; nothing was delivered.
    Aborted {
        kind: CaptureKind,
        error: CaptureError,
    },
}

impl CaptureOutcome {
    pub fn notification(&self, relay_port: u16) -> Notification {
        match self {
            CaptureOutcome::Completed(delivery) => delivery.notification(relay_port),
            CaptureOutcome::Aborted { kind, .. } => {
                let message = match kind {
                    CaptureKind::AreaCapture => "Failed to capture screenshot. Please try again.",
                    CaptureKind::FullViewportCapture => {
                        "Failed to capture visible area. Please try again."
                    }
                };
                Notification::new(NotificationLevel::Error, "Capture Failed", message)
            }
        }
    }

    /// Whether the screenshot reached the relay.
    pub fn is_delivered(&self) -> bool {
        matches!(
            self,
            CaptureOutcome::Completed(DeliveryOutcome::Delivered { .. })
        )
    }
}

/// Counts kept by [`Dispatcher::run`] while it drains finished tasks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Requests that reached a terminal outcome.
    pub finished: usize,
    /// Requests whose screenshot reached the relay.
    pub delivered: usize,
    /// Tasks that panicked before producing an outcome.
    pub panicked: usize,
}

#[derive(Clone)]
pub struct Dispatcher {
    snapshotter: Arc<dyn Snapshotter>,
    pages: Arc<dyn PageExecutor>,
    uploader: Uploader,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(
        snapshotter: Arc<dyn Snapshotter>,
        pages: Arc<dyn PageExecutor>,
        uploader: Uploader,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            snapshotter,
            pages,
            uploader,
            notifier,
        }
    }

    /// Consume messages until every sender is dropped, spawning one task per
    /// request. Returns once every spawned request has finished.
    pub async fn run(self, rx: mpsc::UnboundedReceiver<InboundMessage>) -> DispatchSummary {
        self.run_with(rx, |_| {}).await
    }

    /// Like [`Dispatcher::run`], handing each outcome to `on_outcome` as soon
    /// as its task finishes. Finished tasks are reaped while the channel is
    /// still open, so only in-flight requests are held.
    pub async fn run_with<F>(
        self,
        mut rx: mpsc::UnboundedReceiver<InboundMessage>,
        mut on_outcome: F,
    ) -> DispatchSummary
    where
        F: FnMut(CaptureOutcome),
    {
        let mut tasks = JoinSet::new();
        let mut summary = DispatchSummary::default();
        let mut open = true;

        loop {
            tokio::select! {
                inbound = rx.recv(), if open => match inbound {
                    Some(inbound) => {
                        let request = inbound.message.into_request(inbound.context);
                        let this = self.clone();
                        tasks.spawn(async move { this.handle(request).await });
                    }
                    None => open = false,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => match joined {
                    Ok(outcome) => {
                        summary.finished += 1;
                        if outcome.is_delivered() {
                            summary.delivered += 1;
                        }
                        on_outcome(outcome);
                    }
                    Err(e) => {
                        summary.panicked += 1;
                        tracing::error!(error = %e, "Capture task panicked");
                    }
                },
                else => break,
            }
        }

        tracing::debug!(?summary, "Dispatcher stopped");
        summary
    }

    /// Run one request to its terminal outcome and notify the user once.
    pub async fn handle(&self, request: CaptureRequest) -> CaptureOutcome {
        tracing::info!(
            kind = ?request.kind(),
            context = request.target_context_id(),
            source_url = %request.source_url(),
            "Capture requested"
        );

        let outcome = match self.capture(&request).await {
            Ok(bitmap) => {
                let payload = UploadPayload {
                    bitmap,
                    source_url: request.source_url().to_string(),
                    area: request.selection().copied(),
                };
                CaptureOutcome::Completed(self.uploader.deliver(payload).await)
            }
            Err(error) => {
                tracing::error!(error = %error, "Screenshot capture failed");
                CaptureOutcome::Aborted {
                    kind: request.kind(),
                    error,
                }
            }
        };

        self.notifier
            .notify(outcome.notification(self.uploader.relay_port()))
            .await;
        outcome
    }

    /// Produce the final bitmap for a request.
    async fn capture(&self, request: &CaptureRequest) -> Result<Vec<u8>, CaptureError> {
        let context = request.target_context_id();
        let snapshot = self.snapshotter.capture_viewport(context).await?;

        let Some(area) = request.selection() else {
            return Ok(snapshot);
        };

        let job = CropJob {
            bitmap: snapshot,
            area: *area,
        };
        let cropped = self.pages.crop(context, job).await?;
        if cropped.is_empty() {
            return Err(CaptureError::MalformedResult);
        }
        Ok(cropped)
    }
}
