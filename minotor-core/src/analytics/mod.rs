//! Analytics module for minotor
//!
//! Turns canonical events into report-ready statistics:
//! - [`period`]: relative time windows and the period filter
//! - [`aggregate`]: grouped counts (pages, event types, device types)
//! - [`service`]: the facade the presentation layer calls
//!
//! ## Pipeline
//!
//! ```text
//! EventSource::load_events()  ->  filter_by_period()  ->  page_statistics()
//!                                                     ->  event_type_stats()
//!                                                     ->  device_type_stats()
//! ```
//!
//! The three aggregations are independent and read-only; none of them can
//! fail.

pub mod aggregate;
pub mod period;
pub mod service;

pub use aggregate::{
    device_type_stats, event_type_stats, page_statistics, CountTable, UNKNOWN_LABEL,
};
pub use period::{filter_by_period, Period};
pub use service::{AnalyticsService, PeriodReport};
