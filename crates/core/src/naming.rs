//! Screenshot filename conventions.
//!
//! - Stored by the relay: `screenshot-{epochMillis}-{suffix}.png`, where the
//!   suffix is 8 random hex chars so uploads within the same millisecond do
//!   not overwrite each other.
//! - Saved locally when the relay is unavailable:
//!   `audit-screenshot-{epochMillis}.png`.

use crate::types::Timestamp;

/// Length of the random suffix on stored screenshot names.
const SUFFIX_LEN: usize = 8;

/// Generate the filename under which the relay stores an upload.
pub fn stored_screenshot_filename(now: Timestamp) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "screenshot-{}-{}.png",
        now.timestamp_millis(),
        &suffix[..SUFFIX_LEN]
    )
}

/// Generate the filename for a local fallback download.
///
/// ```
/// use chrono::TimeZone;
/// use webaudit_core::naming::fallback_filename;
///
/// let at = chrono::Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
/// assert_eq!(fallback_filename(at), "audit-screenshot-1700000000123.png");
/// ```
pub fn fallback_filename(now: Timestamp) -> String {
    format!("audit-screenshot-{}.png", now.timestamp_millis())
}

/// Whether `name` is a bare filename that cannot escape its directory.
pub fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}
