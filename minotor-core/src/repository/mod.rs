//! Event repository
//!
//! Turns raw store documents into [`CanonicalEvent`]s.
//!
//! ## Design Principles
//!
//! 1. **Probe, don't assume**: the collection name was never fixed by the
//!    data producer, so a list of candidates is tried in order and the first
//!    non-empty one wins.
//! 2. **Resilience**: bad documents are counted and skipped, never fatal.
//! 3. **Never empty by fault**: store failures degrade to [`fallback_events`].
//! 4. **No caching**: every call re-reads the store.

mod fallback;
mod normalize;

pub use fallback::{fallback_events, FALLBACK_EVENT_COUNT};
pub use normalize::{normalize_document, Document, DATE_STRING_FORMAT};

use std::sync::Arc;

use chrono::Utc;

use crate::config::StoreConfig;
use crate::db::DocumentStore;
use crate::error::Result;
use crate::types::{CanonicalEvent, CollectionInfo};

/// Upper bound on raw documents read per call.
///
/// Bounds latency against an unbounded collection. Larger collections are
/// truncated, not paginated.
pub const MAX_EVENTS_PER_READ: usize = 100;

/// Collection names tried in order when none is configured.
pub const DEFAULT_COLLECTIONS: &[&str] = &[
    "AnalyticsEvent",
    "AnalyticsEvents",
    "analytics_events",
    "events",
    "analytics",
    "user_events",
];

/// Anything that can produce the full canonical event set.
pub trait EventSource: Send + Sync {
    /// Read every available event. Never fails; see [`EventRepository`].
    fn load_events(&self) -> Vec<CanonicalEvent>;
}

/// Where the events of the last read came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOrigin {
    /// Read from the named collection
    Collection(String),
    /// Synthetic data; the reason is for logs only
    Fallback(String),
}

/// Outcome of one repository read, with per-record bookkeeping.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub events: Vec<CanonicalEvent>,
    pub origin: EventOrigin,
    /// Documents that normalized into an event
    pub accepted: usize,
    /// Documents without a usable id or url
    pub dropped: usize,
    /// Documents whose body was not a JSON object
    pub errors: usize,
}

impl LoadReport {
    fn fallback(reason: impl Into<String>) -> Self {
        let events = fallback_events(Utc::now());
        Self {
            accepted: events.len(),
            events,
            origin: EventOrigin::Fallback(reason.into()),
            dropped: 0,
            errors: 0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, EventOrigin::Fallback(_))
    }
}

/// Reads canonical events from a [`DocumentStore`].
#[derive(Clone)]
pub struct EventRepository {
    store: Option<Arc<dyn DocumentStore>>,
    collections: Vec<String>,
    max_events: usize,
}

impl EventRepository {
    /// Create a repository over a connected store
    pub fn new(store: Arc<dyn DocumentStore>, config: &StoreConfig) -> Self {
        Self {
            store: Some(store),
            collections: config.collections.clone(),
            max_events: config.max_events,
        }
    }

    /// Create a repository whose store could not be reached.
    ///
    /// Every read returns fallback data.
    pub fn disconnected(config: &StoreConfig) -> Self {
        Self {
            store: None,
            collections: config.collections.clone(),
            max_events: config.max_events,
        }
    }

    /// Collection names probed, in order
    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    /// Read cap per call
    pub fn max_events(&self) -> usize {
        self.max_events
    }

    /// Read events and report where they came from.
    pub fn load(&self) -> LoadReport {
        let Some(store) = &self.store else {
            tracing::warn!("Document store not connected, using fallback events");
            return LoadReport::fallback("store not connected");
        };

        match self.read_from(store.as_ref()) {
            Ok(Some(report)) => report,
            Ok(None) => {
                tracing::info!(
                    candidates = ?self.collections,
                    "No analytics collection found, using fallback events"
                );
                LoadReport::fallback("no non-empty collection")
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read events, using fallback events");
                LoadReport::fallback(e.to_string())
            }
        }
    }

    /// Find the first non-empty candidate collection.
    fn probe(&self, store: &dyn DocumentStore) -> Option<(String, i64)> {
        for name in &self.collections {
            tracing::debug!(collection = %name, "Probing collection");
            match store.count_documents(name) {
                Ok(count) if count > 0 => {
                    tracing::info!(collection = %name, count, "Found analytics collection");
                    return Some((name.clone(), count));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(collection = %name, error = %e, "Collection not accessible");
                }
            }
        }
        None
    }

    fn read_from(&self, store: &dyn DocumentStore) -> Result<Option<LoadReport>> {
        store.ping()?;

        let Some((collection, _)) = self.probe(store) else {
            return Ok(None);
        };

        let documents = store.find_documents(&collection, self.max_events)?;
        let now = Utc::now();

        let mut events = Vec::with_capacity(documents.len());
        let mut dropped = 0;
        let mut errors = 0;

        for stored in &documents {
            match serde_json::from_str::<Document>(&stored.body) {
                Ok(doc) => match normalize_document(&doc, now) {
                    Some(event) => events.push(event),
                    None => dropped += 1,
                },
                Err(e) => {
                    errors += 1;
                    tracing::warn!(rowid = stored.rowid, error = %e, "Skipping unreadable document");
                }
            }
        }

        tracing::info!(
            collection = %collection,
            accepted = events.len(),
            dropped,
            errors,
            "Events loaded"
        );

        Ok(Some(LoadReport {
            accepted: events.len(),
            events,
            origin: EventOrigin::Collection(collection),
            dropped,
            errors,
        }))
    }

    /// Every collection in the store with its document count.
    ///
    /// Diagnostic only; the event read never depends on it.
    pub fn collection_overview(&self) -> Result<Vec<CollectionInfo>> {
        match &self.store {
            Some(store) => store.list_collections(),
            None => Ok(Vec::new()),
        }
    }
}

impl EventSource for EventRepository {
    fn load_events(&self) -> Vec<CanonicalEvent> {
        self.load().events
    }
}
