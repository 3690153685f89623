//! # minotor-core
//!
//! Core library for minotor - web analytics reporting over a document store.
//!
//! This library provides:
//! - Canonical event types and their normalization from loosely shaped documents
//! - The event repository with collection probing and fallback data
//! - Period filtering and grouped counts for reports
//! - The auth gate against the remote identity service
//! - Background dispatch with a control gate
//! - Configuration, logging and SQLite document storage
//!
//! ## Architecture
//!
//! Data flows in one direction on every request:
//! - **Store:** raw JSON documents grouped in collections (SQLite)
//! - **Repository:** probes collections, normalizes documents into [`CanonicalEvent`]s
//! - **Analytics:** filters by [`Period`] and aggregates into [`CountTable`]s
//!
//! Nothing is cached between requests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use minotor_core::{AnalyticsService, Config, Database, EventRepository, Period};
//!
//! let config = Config::load().expect("failed to load config");
//! let db = Database::open(&config.store.database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let repository = EventRepository::new(Arc::new(db), &config.store);
//! let service = AnalyticsService::new(Arc::new(repository));
//! let report = service.report(Period::Week);
//! println!("{}", report.headline());
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{AnalyticsService, CountTable, Period, PeriodReport};
pub use config::Config;
pub use db::{Database, DocumentStore};
pub use error::{Error, Result};
pub use repository::{EventRepository, EventSource, LoadReport};
pub use types::*;

// Public modules
pub mod analytics;
pub mod auth;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod logging;
pub mod repository;
pub mod types;
