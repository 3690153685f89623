//! Integration tests for the minotor read and report pipeline
//!
//! These tests load fixture documents from `tests/fixtures/analytics/` into a
//! SQLite document store and verify the flow from store to report.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use minotor_core::analytics::{filter_by_period, AnalyticsService, Period};
use minotor_core::config::StoreConfig;
use minotor_core::db::Database;
use minotor_core::repository::{EventOrigin, EventRepository, FALLBACK_EVENT_COUNT};
use serde_json::Value;
use tempfile::TempDir;

/// Get the path to a fixture file
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/analytics")
        .join(name)
}

fn jsonl_fixture(name: &str) -> Vec<Value> {
    std::fs::read_to_string(fixture_path(name))
        .unwrap()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn array_fixture(name: &str) -> Vec<Value> {
    let content = std::fs::read_to_string(fixture_path(name)).unwrap();
    match serde_json::from_str(&content).unwrap() {
        Value::Array(docs) => docs,
        other => panic!("expected array fixture, got {}", other),
    }
}

/// Reference instant the fixture dates are written against
fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Store with the fixture events in `events` and decoys in a later candidate
fn seeded_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    db.insert_documents("events", &jsonl_fixture("events.jsonl"))
        .unwrap();
    db.insert_documents("analytics", &array_fixture("decoy.json"))
        .unwrap();
    db
}

fn ids(events: &[minotor_core::CanonicalEvent]) -> Vec<&str> {
    events.iter().map(|e| e.id.as_str()).collect()
}

// ============================================
// Repository Tests
// ============================================

#[test]
fn test_load_fixture_collection() {
    let repo = EventRepository::new(Arc::new(seeded_db()), &StoreConfig::default());
    let report = repo.load();

    assert_eq!(report.origin, EventOrigin::Collection("events".to_string()));
    assert_eq!(report.accepted, 7);
    assert_eq!(report.dropped, 2);
    assert_eq!(report.errors, 0);

    // Insertion order is kept; the url-less and id-less documents are gone
    assert_eq!(
        ids(&report.events),
        vec![
            "6650aa000000000000000001",
            "6650aa000000000000000002",
            "6650aa000000000000000003",
            "6650aa000000000000000004",
            "6650aa000000000000000005",
            "6650aa000000000000000006",
            "6650aa000000000000000009",
        ]
    );
    assert!(report.events.iter().all(|e| e.url != "/decoy"));
}

#[test]
fn test_fixture_field_shapes() {
    let repo = EventRepository::new(Arc::new(seeded_db()), &StoreConfig::default());
    let events = repo.load().events;

    let first = &events[0];
    assert_eq!(first.formatted_date(), "01/06/2024 10:00");
    assert_eq!(first.screen_width, Some(1920));
    assert_eq!(first.load_time, Some(820));
    assert_eq!(first.page_title.as_deref(), Some("Accueil"));

    // Plain string date, read as UTC
    assert_eq!(events[1].formatted_date(), "31/05/2024 20:15");
    // `timestamp` field holding extended-JSON millis
    assert_eq!(events[2].formatted_date(), "28/05/2024 09:00");
    // Unparseable date string is patched to the read time
    assert!(events[3].timestamp.unwrap() > fixture_now());
    // No date at all stays undated
    assert_eq!(events[6].timestamp, None);
    assert_eq!(events[6].formatted_date(), "N/A");
}

#[test]
fn test_file_backed_store_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("data.db");

    {
        let db = Database::open(&db_path).unwrap();
        db.migrate().unwrap();
        db.insert_documents("events", &jsonl_fixture("events.jsonl"))
            .unwrap();
    }

    let db = Database::open(&db_path).unwrap();
    db.migrate().unwrap();
    let repo = EventRepository::new(Arc::new(db), &StoreConfig::default());
    assert_eq!(repo.load().accepted, 7);

    let overview = repo.collection_overview().unwrap();
    assert_eq!(overview.len(), 1);
    assert_eq!(overview[0].name, "events");
    assert_eq!(overview[0].document_count, 9);
}

#[test]
fn test_disconnected_store_reports_fallback() {
    let service = AnalyticsService::new(Arc::new(EventRepository::disconnected(
        &StoreConfig::default(),
    )));

    let all = service.events_by_period(Period::All);
    assert_eq!(all.len(), FALLBACK_EVENT_COUNT);
    assert_eq!(ids(&all), vec!["test_0", "test_1", "test_2"]);
    assert_eq!(service.page_statistics().total(), FALLBACK_EVENT_COUNT as u64);
}

// ============================================
// Period and Aggregation Tests
// ============================================

#[test]
fn test_periods_over_fixture() {
    let service = AnalyticsService::new(Arc::new(EventRepository::new(
        Arc::new(seeded_db()),
        &StoreConfig::default(),
    )));
    let now = fixture_now();

    let today = service.events_by_period_at(Period::Today, now);
    let week = service.events_by_period_at(Period::Week, now);
    let month = service.events_by_period_at(Period::Month, now);
    let all = service.events_by_period_at(Period::All, now);

    assert_eq!(
        ids(&today),
        vec![
            "6650aa000000000000000001",
            "6650aa000000000000000002",
            "6650aa000000000000000004",
        ]
    );
    assert_eq!(week.len(), 4);
    assert_eq!(month.len(), 5);
    assert_eq!(all.len(), 6);

    for (narrow, wide) in [(&today, &week), (&week, &month), (&month, &all)] {
        assert!(narrow.iter().all(|e| wide.contains(e)));
    }
    assert!(all.iter().all(|e| e.timestamp.is_some()));
}

#[test]
fn test_repeated_reads_are_equal() {
    // Records with an unreadable date are stamped with the read time, so two
    // reads of them differ by construction. Leave that one out.
    let stable: Vec<Value> = jsonl_fixture("events.jsonl")
        .into_iter()
        .filter(|doc| doc["_id"]["$oid"] != "6650aa000000000000000004")
        .collect();
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    db.insert_documents("events", &stable).unwrap();

    let repo = Arc::new(EventRepository::new(Arc::new(db), &StoreConfig::default()));
    let service = AnalyticsService::new(repo.clone());
    let now = fixture_now();

    let first_load = repo.load().events;
    let second_load = repo.load().events;
    assert_eq!(first_load.len(), 6);
    assert_eq!(first_load, second_load);

    for period in [Period::Today, Period::Week, Period::Month, Period::All] {
        let first = service.events_by_period_at(period, now);
        let second = service.events_by_period_at(period, now);
        assert_eq!(first, second, "{:?} differs between reads", period);
    }

    // Filtering keeps store order
    let all = service.events_by_period_at(Period::All, now);
    let expected: Vec<_> = first_load
        .into_iter()
        .filter(|e| e.timestamp.is_some())
        .collect();
    assert_eq!(all, expected);
}

#[test]
fn test_statistics_over_fixture() {
    let service = AnalyticsService::new(Arc::new(EventRepository::new(
        Arc::new(seeded_db()),
        &StoreConfig::default(),
    )));

    let pages = serde_json::to_string(&service.page_statistics()).unwrap();
    assert_eq!(
        pages,
        r#"{"/home":3,"/pricing":1,"/docs":1,"/about":1,"/contact":1}"#
    );

    let event_types = serde_json::to_string(&service.event_type_stats()).unwrap();
    assert_eq!(
        event_types,
        r#"{"page_view":3,"click":1,"Unknown":1,"scroll":1,"download":1}"#
    );

    let devices = serde_json::to_string(&service.device_type_stats()).unwrap();
    assert_eq!(devices, r#"{"Desktop":3,"Mobile":2,"Tablet":1}"#);
}

#[test]
fn test_report_for_week() {
    let service = AnalyticsService::new(Arc::new(EventRepository::new(
        Arc::new(seeded_db()),
        &StoreConfig::default(),
    )));
    let report = service.report_at(Period::Week, fixture_now());

    assert_eq!(report.total_events, 4);
    assert_eq!(report.unique_pages, 3);
    assert_eq!(report.unique_devices, 3);
    assert_eq!(report.pages.get("/home"), Some(2));
    assert_eq!(report.event_types.get("Unknown"), Some(1));
    assert_eq!(report.headline(), "4 events this week");

    let json: Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["period"], "week");
    assert_eq!(json["total_events"], 4);
    assert_eq!(json["pages"]["/home"], 2);
}

#[test]
fn test_read_cap_over_store() {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    let docs: Vec<Value> = (0..250)
        .map(|i| serde_json::json!({"_id": format!("e{}", i), "url": "/bulk"}))
        .collect();
    db.insert_documents("AnalyticsEvents", &docs).unwrap();

    let repo = EventRepository::new(Arc::new(db), &StoreConfig::default());
    let events = repo.load().events;
    assert_eq!(events.len(), 100);
    assert_eq!(events[0].id, "e0");
    assert_eq!(events[99].id, "e99");

    // Undated bulk events never appear in a period
    assert!(filter_by_period(&events, Period::All, fixture_now()).is_empty());
}
