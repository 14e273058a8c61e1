// src/core/content/http_date.rs

//! HTTP date formatting for preformatted `Last-Modified` header values.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// RFC 7231 IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Formats an instant as an IMF-fixdate header value.
pub fn format_http_date(instant: DateTime<Utc>) -> String {
    instant.format(IMF_FIXDATE).to_string()
}

/// Converts a filesystem timestamp to a UTC instant truncated to whole seconds,
/// the resolution HTTP dates can express.
pub fn to_http_instant(time: SystemTime) -> DateTime<Utc> {
    let instant: DateTime<Utc> = time.into();
    DateTime::from_timestamp(instant.timestamp(), 0).unwrap_or(instant)
}
