//! Page-side overlay host.
//!
//! Owns the single selection session allowed per page. Starting a session
//! tears down any existing one, so a page never has two overlays (and two
//! sets of listeners) at once. The host forwards the session's one outbound
//! message to the dispatcher, fire-and-forget.

use tokio::sync::mpsc;
use webaudit_core::selection::{Key, SelectionSession, SelectorEvent, FEEDBACK_DELAY};
use webaudit_core::types::{ContextId, Point};

use crate::dispatcher::InboundMessage;

/// User input delivered to the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayInput {
    PointerDown { at: Point, on_controls: bool },
    PointerMove(Point),
    PointerUp(Point),
    /// "Capture Area" button.
    AreaButton,
    /// "Visible Area" button.
    VisibleButton,
    /// "Cancel" button.
    CancelButton,
    Key(Key),
}

pub struct OverlayHost {
    context: ContextId,
    outbound: mpsc::UnboundedSender<InboundMessage>,
    session: Option<SelectionSession>,
}

impl OverlayHost {
    pub fn new(context: ContextId, outbound: mpsc::UnboundedSender<InboundMessage>) -> Self {
        Self {
            context,
            outbound,
            session: None,
        }
    }

    /// Inject a fresh overlay for `page_url`, replacing any existing one.
    pub fn start(&mut self, page_url: impl Into<String>) {
        if self.session.take().is_some() {
            tracing::debug!(context = self.context, "Replacing existing capture overlay");
        }
        self.session = Some(SelectionSession::new(page_url));
    }

    pub fn session(&self) -> Option<&SelectionSession> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Route one input to the active session and carry out its effect.
    pub fn handle(&mut self, input: OverlayInput) -> SelectorEvent {
        let Some(session) = self.session.as_mut() else {
            return SelectorEvent::Ignored;
        };

        let event = match input {
            OverlayInput::PointerDown { at, on_controls } => session.pointer_down(at, on_controls),
            OverlayInput::PointerMove(at) => session.pointer_move(at),
            OverlayInput::PointerUp(at) => session.pointer_up(at),
            OverlayInput::AreaButton => session.arm_area_capture(),
            OverlayInput::VisibleButton => session.capture_full_viewport(),
            OverlayInput::CancelButton => session.cancel(),
            OverlayInput::Key(key) => session.key_down(key),
        };

        match &event {
            SelectorEvent::Emit(message) => {
                let inbound = InboundMessage {
                    context: self.context,
                    message: message.clone(),
                };
                if self.outbound.send(inbound).is_err() {
                    tracing::warn!(context = self.context, "Capture dispatcher is gone");
                }
            }
            SelectorEvent::Dismissed => {
                self.session = None;
            }
            _ => {}
        }
        event
    }

    /// Keep the overlay up for the feedback delay after a capture was sent,
    /// then remove it.
    pub async fn finish(&mut self) {
        let closing = self
            .session
            .as_ref()
            .is_some_and(|s| s.phase() == webaudit_core::selection::Phase::Closing);
        if !closing {
            return;
        }
        tokio::time::sleep(FEEDBACK_DELAY).await;
        if let Some(session) = self.session.as_mut() {
            session.close();
        }
        self.session = None;
    }
}
