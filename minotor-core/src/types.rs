//! Core domain types for minotor
//!
//! | Term | Definition |
//! |------|------------|
//! | **Document** | One raw JSON record in a store collection, schema not guaranteed |
//! | **Canonical event** | The normalized, store-agnostic form of one recorded interaction |
//! | **Period** | A named relative window (today, week, month, all) |
//! | **Fallback data** | Synthetic events used when nothing real can be read |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display format for event timestamps (`dd/MM/yyyy HH:mm`).
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

// ============================================
// Canonical event
// ============================================

/// One normalized web interaction.
///
/// `id` and `url` are always present: documents lacking either never become
/// a `CanonicalEvent`. Everything past `event_type` is detail-only and takes
/// no part in aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// Opaque unique identifier from the store
    pub id: String,
    /// Page or path the interaction happened on
    pub url: String,
    /// When the interaction happened (absent events never match a period)
    pub timestamp: Option<DateTime<Utc>>,
    /// Device classification (Desktop, Mobile, Tablet, ...)
    pub device_type: Option<String>,
    /// Interaction kind (page_view, click, ...)
    pub event_type: Option<String>,

    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub screen_width: Option<i32>,
    pub screen_height: Option<i32>,
    pub language: Option<String>,
    pub page_title: Option<String>,
    /// Page load time in milliseconds
    pub load_time: Option<i64>,
}

impl CanonicalEvent {
    /// Create an event with only the required fields set.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            timestamp: None,
            device_type: None,
            event_type: None,
            user_agent: None,
            referrer: None,
            screen_width: None,
            screen_height: None,
            language: None,
            page_title: None,
            load_time: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Timestamp formatted as `dd/MM/yyyy HH:mm`, or `N/A` when missing.
    pub fn formatted_date(&self) -> String {
        match self.timestamp {
            Some(ts) => ts.format(DISPLAY_DATE_FORMAT).to_string(),
            None => "N/A".to_string(),
        }
    }
}

// ============================================
// Stored documents
// ============================================

/// A raw document row as kept by the store.
///
/// The body is kept as text so that a corrupt row surfaces as a per-record
/// error in the repository instead of failing the whole read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Store-assigned row id (insertion order)
    pub rowid: i64,
    /// Collection the document belongs to
    pub collection: String,
    /// JSON text of the document
    pub body: String,
}

/// Document count for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub document_count: i64,
}
