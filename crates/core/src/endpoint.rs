//! Relay endpoint resolution.
//!
//! Users configure the URL of the audit tool itself. The relay API listens on
//! a fixed secondary port on the same host, so its base URL is derived by
//! swapping the port.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::CoreError;

/// Tool URL used when none is configured.
pub const DEFAULT_TOOL_URL: &str = "http://localhost:8080";

/// Port the relay API listens on.
pub const DEFAULT_RELAY_PORT: u16 = 8081;

/// Path of the upload endpoint relative to the API base.
pub const UPLOAD_PATH: &str = "/api/screenshot";

static PORT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":\d+").expect("valid regex"));

/// Derive the relay API base from the configured tool URL.
///
/// The URL is parsed and its port replaced; when it cannot be parsed (or
/// cannot carry a port) the first `:NNNN` in the raw string is replaced
/// instead. A trailing `/` is always stripped.
pub fn resolve_api_base(tool_url: &str, relay_port: u16) -> String {
    let parsed = Url::parse(tool_url)
        .ok()
        .and_then(|mut url| url.set_port(Some(relay_port)).ok().map(|()| url));

    let base = match parsed {
        Some(url) => url.to_string(),
        None => PORT_RE
            .replace(tool_url, format!(":{relay_port}").as_str())
            .into_owned(),
    };

    base.trim_end_matches('/').to_string()
}

/// Full URL of the upload endpoint.
pub fn upload_url(api_base: &str) -> String {
    format!("{api_base}{UPLOAD_PATH}")
}

/// URL that opens the consuming application on a freshly stored screenshot.
///
/// Query: `screenshot={filename}&sourceUrl={source_url}`; both values are
/// form-encoded exactly once.
pub fn open_url(tool_url: &str, filename: &str, source_url: &str) -> Result<String, CoreError> {
    let mut url = Url::parse(tool_url)
        .map_err(|e| CoreError::Validation(format!("Invalid tool URL '{tool_url}': {e}")))?;
    url.query_pairs_mut()
        .append_pair("screenshot", filename)
        .append_pair("sourceUrl", source_url);
    Ok(url.to_string())
}
