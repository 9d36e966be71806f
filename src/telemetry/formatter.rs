//! Renders a [`Reading`] as one line of a daily log
//!
//! ```text
//! 14:13:20 | Device: esp32-a | WiFi RSSI: -61 dBm | Free Heap: 45210 bytes | Uptime: 123.5s
//! ```

use chrono::{DateTime, Local, Utc};
use serde_json::Value;

use super::reading::Reading;

/// Shown when the payload has no device id
pub const UNKNOWN_DEVICE: &str = "unknown";

/// Shown for any other missing value
pub const NOT_AVAILABLE: &str = "N/A";

/// Shown when the device sent no usable timestamp (it has not synced NTP yet)
pub const EPOCH_TIME: &str = "00:00:00";

/// Time-of-day format of the first column
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Format a reading as a log line, without the trailing newline
///
/// Never fails: missing or oddly typed fields fall back to placeholders.
pub fn format_entry(reading: &Reading) -> String {
    format!(
        "{} | Device: {} | WiFi RSSI: {} dBm | Free Heap: {} bytes | Uptime: {:.1}s",
        format_time(reading.timestamp_secs()),
        field_text(reading.device_id.as_ref(), UNKNOWN_DEVICE),
        field_text(reading.wifi_rssi.as_ref(), NOT_AVAILABLE),
        field_text(reading.free_heap.as_ref(), NOT_AVAILABLE),
        reading.uptime_seconds(),
    )
}

/// Local time of day for a unix timestamp
fn format_time(secs: Option<f64>) -> String {
    secs.and_then(|secs| {
        let whole = secs.floor();
        let nanos = (((secs - whole) * 1e9) as u32).min(999_999_999);
        DateTime::<Utc>::from_timestamp(whole as i64, nanos)
    })
    .map(|utc| utc.with_timezone(&Local).format(TIME_FORMAT).to_string())
    .unwrap_or_else(|| EPOCH_TIME.to_string())
}

/// Strings as sent, other JSON values in their natural text form
fn field_text(value: Option<&Value>, placeholder: &str) -> String {
    match value {
        None => placeholder.to_string(),
        Some(Value::String(s)) => escape_control(s),
        Some(other) => other.to_string(),
    }
}

/// Control characters are written as escapes so an entry stays on one line
fn escape_control(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_control() {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}
