//! Web audit capture domain crate.
//!
//! Pure building blocks shared by the capture pipeline and the screenshot
//! relay:
//!
//! - [`types`]: selection geometry, capture requests and the extension
//!   message envelope.
//! - [`selection`]: the area-selector overlay state machine.
//! - [`crop`]: device-pixel-ratio aware viewport cropping.
//! - [`endpoint`]: relay API base resolution and consuming-app URLs.
//! - [`naming`]: stored and fallback screenshot filenames.
//! - [`handshake`]: extension presence messages and detection.
//! - [`annotation`]: the fixed-aspect annotation canvas.

pub mod annotation;
pub mod crop;
pub mod endpoint;
pub mod error;
pub mod handshake;
pub mod naming;
pub mod selection;
pub mod types;

pub use error::CoreError;
pub use types::{CaptureKind, CaptureRequest, ExtensionMessage, Point, SelectionRect};
