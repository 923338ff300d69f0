//! Output formatting helpers

use chrono::{DateTime, Utc};
use policy::ImageRecord;

/// Format a byte count ("1.50 KB")
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Age of a push relative to `now` ("3 days ago")
pub fn format_age(pushed_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - pushed_at).num_seconds();
    if seconds < 0 {
        return "in the future".to_string();
    }

    let (amount, unit) = match seconds {
        s if s < 60 => (s, "second"),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 604_800 => (s / 86_400, "day"),
        s => (s / 604_800, "week"),
    };
    let plural = if amount == 1 { "" } else { "s" };
    format!("{} {}{} ago", amount, unit, plural)
}

/// Short human label for an image: digest prefix, else its tags
pub fn image_label(image: &ImageRecord) -> String {
    match &image.digest {
        Some(digest) => short_digest(digest).to_string(),
        None if image.is_untagged() => "<unidentified>".to_string(),
        None => image.tags.join(","),
    }
}

/// `sha256:` plus the first 12 hex characters
pub fn short_digest(digest: &str) -> &str {
    let end = digest
        .find(':')
        .map_or(12, |i| i + 1 + 12)
        .min(digest.len());
    digest.get(..end).unwrap_or(digest)
}
