//! Analytics facade consumed by the presentation layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::aggregate::{device_type_stats, event_type_stats, page_statistics, CountTable};
use super::period::{filter_by_period, Period};
use crate::repository::EventSource;
use crate::types::CanonicalEvent;

/// Everything a dashboard needs for one period, computed from a single read.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodReport {
    pub period: Period,
    pub generated_at: DateTime<Utc>,
    pub total_events: usize,
    pub unique_pages: usize,
    pub unique_devices: usize,
    pub pages: CountTable,
    pub event_types: CountTable,
    pub device_types: CountTable,
}

impl PeriodReport {
    /// Aggregate an already-filtered event list.
    pub fn from_events(period: Period, events: &[CanonicalEvent], now: DateTime<Utc>) -> Self {
        let pages = page_statistics(events);
        let device_types = device_type_stats(events);
        Self {
            period,
            generated_at: now,
            total_events: events.len(),
            unique_pages: pages.len(),
            unique_devices: device_types.len(),
            pages,
            event_types: event_type_stats(events),
            device_types,
        }
    }

    /// e.g. "12 events this week"
    pub fn headline(&self) -> String {
        let noun = if self.total_events == 1 { "event" } else { "events" };
        format!("{} {} {}", self.total_events, noun, self.period.label())
    }
}

/// Reads events and turns them into report-ready statistics.
///
/// Holds no state between calls; every operation re-reads its source.
#[derive(Clone)]
pub struct AnalyticsService {
    source: Arc<dyn EventSource>,
}

impl AnalyticsService {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self { source }
    }

    /// Events inside `period`, relative to the current time.
    pub fn events_by_period(&self, period: Period) -> Vec<CanonicalEvent> {
        self.events_by_period_at(period, Utc::now())
    }

    /// Events inside `period`, relative to `now`.
    pub fn events_by_period_at(&self, period: Period, now: DateTime<Utc>) -> Vec<CanonicalEvent> {
        let events = self.source.load_events();
        let filtered = filter_by_period(&events, period, now);
        tracing::debug!(
            period = %period,
            loaded = events.len(),
            kept = filtered.len(),
            "Filtered events by period"
        );
        filtered
    }

    /// Page popularity over every loaded event, most visited first.
    pub fn page_statistics(&self) -> CountTable {
        page_statistics(&self.source.load_events())
    }

    /// Event-type distribution over every loaded event.
    pub fn event_type_stats(&self) -> CountTable {
        event_type_stats(&self.source.load_events())
    }

    /// Device-type distribution over every loaded event.
    pub fn device_type_stats(&self) -> CountTable {
        device_type_stats(&self.source.load_events())
    }

    /// Filter once and aggregate the filtered set.
    pub fn report(&self, period: Period) -> PeriodReport {
        self.report_at(period, Utc::now())
    }

    pub fn report_at(&self, period: Period, now: DateTime<Utc>) -> PeriodReport {
        let events = self.events_by_period_at(period, now);
        PeriodReport::from_events(period, &events, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    struct FixedSource(Vec<CanonicalEvent>);

    impl EventSource for FixedSource {
        fn load_events(&self) -> Vec<CanonicalEvent> {
            self.0.clone()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn service() -> AnalyticsService {
        let events = vec![
            CanonicalEvent::new("1", "/home")
                .with_timestamp(now() - Duration::hours(2))
                .with_device_type("Desktop")
                .with_event_type("page_view"),
            CanonicalEvent::new("2", "/pricing")
                .with_timestamp(now() - Duration::days(3))
                .with_device_type("Mobile"),
            CanonicalEvent::new("3", "/pricing")
                .with_timestamp(now() - Duration::days(40))
                .with_event_type("click"),
            CanonicalEvent::new("4", "/pricing"),
        ];
        AnalyticsService::new(Arc::new(FixedSource(events)))
    }

    #[test]
    fn test_statistics_cover_unfiltered_set() {
        let svc = service();
        let pages: Vec<_> = svc.page_statistics().iter().map(|(l, c)| (l.to_string(), c)).collect();
        assert_eq!(
            pages,
            vec![("/pricing".to_string(), 3), ("/home".to_string(), 1)]
        );
        assert_eq!(svc.device_type_stats().total(), 2);
        assert_eq!(svc.event_type_stats().get("Unknown"), Some(2));
    }

    #[test]
    fn test_events_by_period() {
        let svc = service();
        let week: Vec<_> = svc
            .events_by_period_at(Period::Week, now())
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(week, vec!["1", "2"]);

        // Undated event 4 is never reported
        assert_eq!(svc.events_by_period_at(Period::All, now()).len(), 3);
    }

    #[test]
    fn test_events_by_period_is_repeatable() {
        let svc = service();
        assert_eq!(
            svc.events_by_period_at(Period::All, now()),
            svc.events_by_period_at(Period::All, now())
        );
    }

    #[test]
    fn test_report_aggregates_filtered_set() {
        let report = service().report_at(Period::Week, now());
        assert_eq!(report.total_events, 2);
        assert_eq!(report.unique_pages, 2);
        assert_eq!(report.unique_devices, 2);
        assert_eq!(report.event_types.get("page_view"), Some(1));
        assert_eq!(report.event_types.get("Unknown"), Some(1));
        assert_eq!(report.headline(), "2 events this week");
    }

    #[test]
    fn test_report_on_empty_window() {
        let svc = AnalyticsService::new(Arc::new(FixedSource(vec![])));
        let report = svc.report_at(Period::Today, now());
        assert_eq!(report.total_events, 0);
        assert!(report.pages.is_empty());
        assert_eq!(report.headline(), "0 events today");
    }
}
