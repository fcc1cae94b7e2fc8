//! Human-readable formatting of sizes, rates and timestamps.

use chrono::{DateTime, Local};

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with binary units: whole bytes, one decimal above that
pub fn format_bytes(bytes: f64) -> String {
    if !bytes.is_finite() {
        return "—".to_string();
    }
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", value.round(), UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Format a throughput; `None` before the first measured tick
pub fn format_rate(rate: Option<f64>) -> String {
    format!("{}/s", format_bytes(rate.unwrap_or(0.0)))
}

/// `HH:MM:SS` in local time
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}
