//! Extension presence handshake.
//!
//! The audit tool page asks whether the capture extension is installed by
//! posting a window message; the injected script answers, and also announces
//! itself unprompted on the tool's own pages. A hidden marker element gives
//! a second, message-free detection signal.

use serde::{Deserialize, Serialize};
use url::Url;

/// Version reported in handshake replies.
pub const EXTENSION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Attribute set on the hidden marker element.
pub const MARKER_ATTRIBUTE: &str = "data-web-audit-extension";
/// Value of [`MARKER_ATTRIBUTE`].
pub const MARKER_VALUE: &str = "installed";
/// Attribute carrying the extension version on the marker element.
pub const MARKER_VERSION_ATTRIBUTE: &str = "data-extension-version";

/// Window messages exchanged between the page and the injected script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PageMessage {
    #[serde(rename = "WEB_AUDIT_EXTENSION_CHECK")]
    Check,
    #[serde(rename = "WEB_AUDIT_EXTENSION_RESPONSE")]
    Response { installed: bool, version: String },
    #[serde(rename = "WEB_AUDIT_EXTENSION_ANNOUNCE")]
    Announce { installed: bool, version: String },
}

/// Attributes of the hidden marker element, in insertion order.
pub fn marker_attributes() -> [(&'static str, &'static str); 2] {
    [
        (MARKER_ATTRIBUTE, MARKER_VALUE),
        (MARKER_VERSION_ATTRIBUTE, EXTENSION_VERSION),
    ]
}

/// Injected-script side: reply to a presence check, ignore everything else.
pub fn respond(message: &PageMessage) -> Option<PageMessage> {
    match message {
        PageMessage::Check => Some(PageMessage::Response {
            installed: true,
            version: EXTENSION_VERSION.to_string(),
        }),
        _ => None,
    }
}

/// Injected-script side: announce presence when `page_url` is served by the
/// configured audit tool (same host and port).
pub fn announcement_for(page_url: &str, tool_url: &str) -> Option<PageMessage> {
    let page = Url::parse(page_url).ok()?;
    let tool = Url::parse(tool_url).ok()?;
    let same_host = page.host_str().is_some() && page.host_str() == tool.host_str();
    let same_port = page.port_or_known_default() == tool.port_or_known_default();
    (same_host && same_port).then(|| PageMessage::Announce {
        installed: true,
        version: EXTENSION_VERSION.to_string(),
    })
}

/// Result of a successful detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPresence {
    pub version: String,
}

/// App side: decides whether the extension is installed.
///
/// Only messages posted from the page's own origin are trusted; anything
/// else (another frame, an embedded third-party page) is ignored.
#[derive(Debug)]
pub struct ExtensionDetector {
    page_origin: String,
    presence: Option<ExtensionPresence>,
}

impl ExtensionDetector {
    /// `page_url` is the URL of the page running the detector.
    pub fn new(page_url: &str) -> Option<Self> {
        let origin = Url::parse(page_url).ok()?.origin();
        if !origin.is_tuple() {
            return None;
        }
        Some(Self {
            page_origin: origin.ascii_serialization(),
            presence: None,
        })
    }

    /// The message the page posts to start detection.
    pub fn check_message(&self) -> PageMessage {
        PageMessage::Check
    }

    /// Feed a received window message. Returns the presence the first time
    /// a trusted positive reply is seen.
    pub fn observe(&mut self, origin: &str, message: &PageMessage) -> Option<&ExtensionPresence> {
        if origin != self.page_origin || self.presence.is_some() {
            return None;
        }
        let version = match message {
            PageMessage::Response {
                installed: true,
                version,
            }
            | PageMessage::Announce {
                installed: true,
                version,
            } => version.clone(),
            _ => return None,
        };
        self.presence = Some(ExtensionPresence { version });
        self.presence.as_ref()
    }

    pub fn presence(&self) -> Option<&ExtensionPresence> {
        self.presence.as_ref()
    }
}
