//! Timestamp helpers.

use chrono::{DateTime, Utc};

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Returns the current UTC time as an ISO 8601 string with microseconds.
///
/// # Examples
///
/// ```
/// use caseflow::utils::iso_timestamp;
///
/// let ts = iso_timestamp();
/// assert!(ts.contains('T'));
/// assert!(ts.ends_with("+00:00"));
/// ```
#[must_use]
pub fn iso_timestamp() -> String {
    to_iso(&now_utc())
}

/// Formats a timestamp the way [`iso_timestamp`] does.
#[must_use]
pub fn to_iso(ts: &Timestamp) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Whole seconds elapsed between two timestamps, never negative.
#[must_use]
pub fn elapsed_secs(from: &Timestamp, to: &Timestamp) -> f64 {
    let millis = (*to - *from).num_milliseconds().max(0);
    #[allow(clippy::cast_precision_loss)]
    let secs = millis as f64 / 1000.0;
    secs
}
