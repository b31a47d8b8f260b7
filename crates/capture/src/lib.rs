//! Screenshot capture pipeline.
//!
//! Wires the page-level overlay to the privileged capture side:
//!
//! - [`overlay`]: hosts the single active selection session per page and
//!   forwards its outbound message.
//! - [`dispatcher`]: takes viewport snapshots and routes them through the
//!   page-side cropper to the uploader.
//! - [`page`]: the page context that performs the crop.
//! - [`snapshot`]: the privileged viewport snapshot source.
//! - [`uploader`]: multipart delivery to the relay with local fallback.
//! - [`fallback`]: data-URI encoding and the local download directory.
//! - [`notify`]: user notifications and the consuming-app launcher.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fallback;
pub mod notify;
pub mod overlay;
pub mod page;
pub mod snapshot;
pub mod uploader;

pub use dispatcher::{CaptureOutcome, Dispatcher, InboundMessage};
pub use error::{CaptureError, SaveError, UploadError};
pub use uploader::{DeliveryOutcome, Uploader};
