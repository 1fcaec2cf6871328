use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Naive layouts accepted in addition to RFC 3339; interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a store timestamp. Accepts RFC 3339, the minute-precision form the
/// admin form produces, and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Format a timestamp string for display, e.g. "Friday, January 5, 2024 at 09:30"
pub fn format_date(date: &str) -> String {
    if date.trim().is_empty() {
        return "Not available".to_string();
    }
    match parse_timestamp(date) {
        Some(dt) => dt.format("%A, %B %-d, %Y at %H:%M").to_string(),
        None => "Invalid date".to_string(),
    }
}

/// Status ids read better with spaces: "OUT_FOR_DELIVERY" -> "OUT FOR DELIVERY"
pub fn status_display(status: &str) -> String {
    status.replace('_', " ")
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// "1 day", "3 days"
pub fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}
