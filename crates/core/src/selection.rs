//! Area-selector overlay state machine.
//!
//! A [`SelectionSession`] models one overlay injected into a page: it tracks
//! a single drag gesture, keeps the instructional text in sync and produces
//! at most one [`ExtensionMessage`] over its lifetime. Rendering is left to
//! the host; the session only reports what changed.

use std::time::Duration;

use crate::types::{ExtensionMessage, Point, SelectionRect};

/// How long the overlay stays visible after a capture was requested.
pub const FEEDBACK_DELAY: Duration = Duration::from_millis(500);

pub const HINT_IDLE: &str = "Click and drag to select area, or use buttons above";
pub const HINT_IDLE_WITH_ESCAPE: &str =
    "Click and drag to select area, use buttons above, or press ESC to cancel";
pub const HINT_AREA_ARMED: &str = "Click and drag to select area to capture";
pub const HINT_CAPTURING_AREA: &str = "Capturing screenshot...";
pub const HINT_CAPTURING_VIEWPORT: &str = "Capturing visible area...";

/// Keys the overlay reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

/// Lifecycle of one overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Waiting for a drag or a control click.
    Idle,
    /// A drag is in progress.
    Dragging { anchor: Point, current: Point },
    /// A capture request was sent; the overlay is showing feedback.
    Closing,
    /// The overlay has been removed from the page.
    Closed,
}

/// Live outline shown while dragging.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionPreview {
    pub rect: SelectionRect,
    /// Dimension readout, e.g. `"200 × 150"`.
    pub label: String,
}

/// What the host must do in response to an input.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorEvent {
    /// Input had no effect in the current phase.
    Ignored,
    /// A drag started; the previous outline and readout must be cleared.
    Started,
    /// The outline moved.
    Preview(SelectionPreview),
    /// The drag ended below the size threshold; hide the outline and keep
    /// the overlay open.
    Discarded,
    /// Send this message and tear the overlay down after [`FEEDBACK_DELAY`].
    Emit(ExtensionMessage),
    /// Remove the overlay without sending anything.
    Dismissed,
}

/// One overlay session bound to the page it was injected into.
#[derive(Debug)]
pub struct SelectionSession {
    page_url: String,
    phase: Phase,
    instructions: &'static str,
}

impl SelectionSession {
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            phase: Phase::Idle,
            instructions: HINT_IDLE,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn instructions(&self) -> &'static str {
        self.instructions
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    /// Whether the overlay is still on the page.
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Closed)
    }

    /// Whether the overlay still accepts input.
    fn accepts_input(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::Dragging { .. })
    }

    /// Pointer pressed. Presses on the control bar never start a drag.
    pub fn pointer_down(&mut self, at: Point, on_controls: bool) -> SelectorEvent {
        if on_controls || !self.accepts_input() {
            return SelectorEvent::Ignored;
        }
        self.phase = Phase::Dragging {
            anchor: at,
            current: at,
        };
        SelectorEvent::Started
    }

    pub fn pointer_move(&mut self, at: Point) -> SelectorEvent {
        let Phase::Dragging { anchor, .. } = self.phase else {
            return SelectorEvent::Ignored;
        };
        self.phase = Phase::Dragging {
            anchor,
            current: at,
        };
        let rect = SelectionRect::from_corners(anchor, at);
        SelectorEvent::Preview(SelectionPreview {
            label: format!("{} × {}", rect.width.round(), rect.height.round()),
            rect,
        })
    }

    /// Pointer released: finalize the rectangle against the release point.
    pub fn pointer_up(&mut self, at: Point) -> SelectorEvent {
        let Phase::Dragging { anchor, .. } = self.phase else {
            return SelectorEvent::Ignored;
        };
        let rect = SelectionRect::from_corners(anchor, at);
        if !rect.exceeds_threshold() {
            self.phase = Phase::Idle;
            return SelectorEvent::Discarded;
        }
        self.phase = Phase::Closing;
        self.instructions = HINT_CAPTURING_AREA;
        SelectorEvent::Emit(ExtensionMessage::CaptureArea {
            area: rect,
            url: self.page_url.clone(),
        })
    }

    /// "Capture Area" button: only updates the hint.
    pub fn arm_area_capture(&mut self) -> SelectorEvent {
        if !self.accepts_input() {
            return SelectorEvent::Ignored;
        }
        self.instructions = HINT_AREA_ARMED;
        SelectorEvent::Ignored
    }

    /// "Visible Area" button: bypasses the drag lifecycle.
    pub fn capture_full_viewport(&mut self) -> SelectorEvent {
        if !self.accepts_input() {
            return SelectorEvent::Ignored;
        }
        self.phase = Phase::Closing;
        self.instructions = HINT_CAPTURING_VIEWPORT;
        SelectorEvent::Emit(ExtensionMessage::CaptureFullPage {
            url: self.page_url.clone(),
        })
    }

    pub fn key_down(&mut self, key: Key) -> SelectorEvent {
        match key {
            Key::Escape => self.cancel(),
            Key::Other => SelectorEvent::Ignored,
        }
    }

    /// Cancel button or Escape.
    pub fn cancel(&mut self) -> SelectorEvent {
        if !self.accepts_input() {
            return SelectorEvent::Ignored;
        }
        self.phase = Phase::Closed;
        SelectorEvent::Dismissed
    }

    /// Swap in the longer hint once the user has had time to read the first.
    pub fn extend_hint(&mut self) {
        if matches!(self.phase, Phase::Idle) && self.instructions == HINT_IDLE {
            self.instructions = HINT_IDLE_WITH_ESCAPE;
        }
    }

    /// Remove the overlay after the feedback delay elapsed.
    pub fn close(&mut self) {
        self.phase = Phase::Closed;
    }
}
