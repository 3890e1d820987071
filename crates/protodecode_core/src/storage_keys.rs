use chrono::{DateTime, Utc};

pub const OUTPUT_OBJECT_SUFFIX: &str = ".txt";

/// Seconds since the Unix epoch, with the sub-second part as a fraction.
pub fn unix_timestamp_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) / 1_000_000_000.0
}

/// Shortest round-trip text for `timestamp`; integral values keep a `.0`.
pub fn format_timestamp(timestamp: f64) -> String {
    let text = timestamp.to_string();
    if timestamp.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

/// `<timestamp>.txt`, under `prefix/` when a prefix is configured.
///
/// Keys are only as unique as the clock: two writes within the same
/// representable instant share a key.
pub fn output_object_key(prefix: &str, timestamp: f64) -> String {
    let file_name = format!("{}{OUTPUT_OBJECT_SUFFIX}", format_timestamp(timestamp));
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        file_name
    } else {
        format!("{trimmed}/{file_name}")
    }
}
