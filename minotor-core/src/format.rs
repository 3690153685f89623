//! Formatting helpers for report output.

use chrono::{DateTime, Utc};

/// Placeholder for a missing value in tables
pub const MISSING: &str = "-";

/// Format a timestamp relative to `now` (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Like [`format_relative_time`], with [`MISSING`] for undated events.
pub fn format_relative_time_opt(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match ts {
        Some(ts) => format_relative_time(ts, now),
        None => MISSING.to_string(),
    }
}

/// Page load time, e.g. "850 ms" or "1.2 s".
pub fn format_load_time(millis: Option<i64>) -> String {
    match millis {
        Some(ms) if ms >= 1000 => format!("{:.1} s", ms as f64 / 1000.0),
        Some(ms) => format!("{} ms", ms),
        None => MISSING.to_string(),
    }
}

/// Cut `text` to at most `width` characters, marking the cut with "...".
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width <= 3 {
        return text.chars().take(width).collect();
    }
    let kept: String = text.chars().take(width - 3).collect();
    format!("{}...", kept)
}

/// Horizontal bar proportional to `value / max`.
pub fn bar(value: u64, max: u64, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = ((value as f64 / max as f64) * width as f64).round() as usize;
    "#".repeat(filled.min(width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_relative_time() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(format_relative_time(now + Duration::seconds(5), now), "just now");
        assert_eq!(format_relative_time(now - Duration::seconds(30), now), "30s ago");
        assert_eq!(format_relative_time(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_relative_time(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_relative_time(now - Duration::days(2), now), "2d ago");
        assert_eq!(format_relative_time(now - Duration::days(30), now), "May 02");
        assert_eq!(format_relative_time_opt(None, now), "-");
    }

    #[test]
    fn test_load_time() {
        assert_eq!(format_load_time(Some(850)), "850 ms");
        assert_eq!(format_load_time(Some(1500)), "1.5 s");
        assert_eq!(format_load_time(None), "-");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("/home", 10), "/home");
        assert_eq!(truncate("/products/very-long-slug", 12), "/products...");
        assert_eq!(truncate("/abc", 2), "/a");
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(5, 10, 10), "#####");
        assert_eq!(bar(10, 10, 4), "####");
        assert_eq!(bar(0, 10, 4), "");
        assert_eq!(bar(3, 0, 4), "");
    }
}
