//! Timestamp and number formatting helpers.

mod format;
pub mod timestamps;

pub use format::{format_count, format_currency, format_thousands, round2};
pub use timestamps::{elapsed_secs, iso_timestamp, now_utc, to_iso, Timestamp};
