//! CSV export of event lists

use std::borrow::Cow;
use std::io::{self, Write};

use minotor_core::CanonicalEvent;

pub const CSV_HEADER: &str = "URL,Date,Device,EventType";

/// Write `events` as CSV, one row per event after the header.
///
/// Missing device or event types are written as empty fields.
pub fn write_csv<W: Write>(mut out: W, events: &[CanonicalEvent]) -> io::Result<()> {
    writeln!(out, "{}", CSV_HEADER)?;
    for event in events {
        writeln!(
            out,
            "{},{},{},{}",
            csv_field(&event.url),
            csv_field(&event.formatted_date()),
            csv_field(event.device_type.as_deref().unwrap_or("")),
            csv_field(event.event_type.as_deref().unwrap_or("")),
        )?;
    }
    out.flush()
}

/// Quote a field when it contains a separator, a quote or a line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
