//! Text rendering for terminal output

use chrono::{DateTime, Utc};
use minotor_core::format::{bar, format_load_time, format_relative_time_opt, truncate, MISSING};
use minotor_core::{CanonicalEvent, CollectionInfo, CountTable, PeriodReport};

const LABEL_WIDTH: usize = 40;
const BAR_WIDTH: usize = 20;

/// Render a period report with at most `top` rows per table.
pub fn report(report: &PeriodReport, top: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("Minot'Or analytics: {}\n", report.headline()));
    out.push_str(&format!(
        "  Unique pages: {}  Unique devices: {}\n",
        report.unique_pages, report.unique_devices
    ));

    section(&mut out, "Top pages", &report.pages, top);
    section(&mut out, "Event types", &report.event_types, top);
    section(&mut out, "Devices", &report.device_types, top);
    out
}

fn section(out: &mut String, title: &str, table: &CountTable, top: usize) {
    out.push_str(&format!("\n{}\n", title));
    if table.is_empty() {
        out.push_str("  (no data)\n");
        return;
    }

    let max = table.iter().map(|(_, count)| count).max().unwrap_or(0);
    for (label, pct) in table.percentages().into_iter().take(top) {
        let count = table.get(label).unwrap_or(0);
        out.push_str(&format!(
            "  {:<width$} {:>6} {:>5.1}%  {}\n",
            truncate(label, LABEL_WIDTH),
            count,
            pct,
            bar(count, max, BAR_WIDTH),
            width = LABEL_WIDTH
        ));
    }

    let hidden = table.len().saturating_sub(top);
    if hidden > 0 {
        out.push_str(&format!("  ... and {} more\n", hidden));
    }
}

/// Detail table of individual events.
pub fn events(events: &[CanonicalEvent], now: DateTime<Utc>) -> String {
    let mut out = format!(
        "{:<16} {:<10} {:<30} {:<10} {:<12} {:>8}\n",
        "DATE", "WHEN", "URL", "DEVICE", "EVENT", "LOAD"
    );
    for event in events {
        out.push_str(&format!(
            "{:<16} {:<10} {:<30} {:<10} {:<12} {:>8}\n",
            event.formatted_date(),
            format_relative_time_opt(event.timestamp, now),
            truncate(&event.url, 30),
            event.device_type.as_deref().unwrap_or(MISSING),
            truncate(event.event_type.as_deref().unwrap_or(MISSING), 12),
            format_load_time(event.load_time),
        ));
    }
    out
}

/// Store diagnostic listing.
pub fn collections(collections: &[CollectionInfo], candidates: &[String]) -> String {
    let mut out = String::from("Collections:\n");
    if collections.is_empty() {
        out.push_str("  (none)\n");
    }
    for info in collections {
        let marker = if candidates.contains(&info.name) { "*" } else { " " };
        out.push_str(&format!(
            "{} {:<30} {:>8} document(s)\n",
            marker, info.name, info.document_count
        ));
    }
    out.push_str(&format!("\nProbed in order: {}\n", candidates.join(", ")));
    out
}
