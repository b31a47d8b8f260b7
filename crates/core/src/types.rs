//! Capture pipeline data model.
//!
//! Everything here is ephemeral: a request is created per capture, passed by
//! value across contexts and dropped once the pipeline reaches a terminal
//! outcome.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifier of the page context (browser tab) a request originated from.
pub type ContextId = u64;

/// Selections must exceed this many CSS pixels on both axes to be forwarded.
pub const MIN_SELECTION_PX: f64 = 10.0;

/// A pointer position in CSS pixels relative to the page viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rectangular selection in CSS pixels relative to the page viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl SelectionRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Normalize two drag endpoints into a rectangle anchored at the
    /// top-left-most corner.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    /// Whether the selection is large enough to be treated as intentional.
    pub fn exceeds_threshold(&self) -> bool {
        self.width > MIN_SELECTION_PX && self.height > MIN_SELECTION_PX
    }

    /// The same rectangle expressed in device pixels.
    pub fn scaled(&self, ratio: f64) -> Self {
        Self {
            left: self.left * ratio,
            top: self.top * ratio,
            width: self.width * ratio,
            height: self.height * ratio,
        }
    }

    /// Output surface size in whole pixels.
    pub fn output_size(&self) -> (u32, u32) {
        (
            self.width.round().max(1.0) as u32,
            self.height.round().max(1.0) as u32,
        )
    }

    /// Reject rectangles that cannot describe a drawable region.
    pub fn validate(&self) -> Result<(), CoreError> {
        let finite = [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(CoreError::Validation(
                "Selection coordinates must be finite numbers".into(),
            ));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(CoreError::Validation(format!(
                "Selection must have a positive size, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// What a capture request asks the dispatcher to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureKind {
    AreaCapture,
    FullViewportCapture,
}

/// A single capture request routed from a page to the dispatcher.
///
/// `area` is present iff `kind` is [`CaptureKind::AreaCapture`]; the fields
/// are private so the constructors can hold that invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    kind: CaptureKind,
    area: Option<SelectionRect>,
    source_url: String,
    target_context_id: ContextId,
}

impl CaptureRequest {
    pub fn area(area: SelectionRect, source_url: impl Into<String>, context: ContextId) -> Self {
        Self {
            kind: CaptureKind::AreaCapture,
            area: Some(area),
            source_url: source_url.into(),
            target_context_id: context,
        }
    }

    pub fn full_viewport(source_url: impl Into<String>, context: ContextId) -> Self {
        Self {
            kind: CaptureKind::FullViewportCapture,
            area: None,
            source_url: source_url.into(),
            target_context_id: context,
        }
    }

    pub fn kind(&self) -> CaptureKind {
        self.kind
    }

    pub fn selection(&self) -> Option<&SelectionRect> {
        self.area.as_ref()
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn target_context_id(&self) -> ContextId {
        self.target_context_id
    }
}

/// Inbound trigger sent from the page overlay to the dispatcher.
///
/// Wire format: `{"action": "captureArea", "area": {...}, "url": "..."}` or
/// `{"action": "captureFullPage", "url": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ExtensionMessage {
    CaptureArea { area: SelectionRect, url: String },
    CaptureFullPage { url: String },
}

impl ExtensionMessage {
    /// Attach the sender's context and turn the message into a request.
    pub fn into_request(self, context: ContextId) -> CaptureRequest {
        match self {
            ExtensionMessage::CaptureArea { area, url } => CaptureRequest::area(area, url, context),
            ExtensionMessage::CaptureFullPage { url } => CaptureRequest::full_viewport(url, context),
        }
    }
}
