//! Document normalization
//!
//! Producers never agreed on a schema, so each canonical field is resolved
//! by an ordered list of rules. Every rule is total: it inspects the document
//! and returns `Some` on a match or `None` to let the next rule try. The
//! first match wins.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::types::CanonicalEvent;

/// Leading format of string-typed `date` fields (no zone; read as UTC).
pub const DATE_STRING_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A JSON document as read from the store.
pub type Document = Map<String, Value>;

type Rule<T> = fn(&Document) -> Option<T>;

const ID_RULES: &[Rule<String>] = &[object_id, string_id, integer_id, plain_id];

const TIMESTAMP_RULES: &[Rule<DateTime<Utc>>] = &[native_date, native_timestamp, string_date];

/// Keys whose presence means the producer meant to record a time.
const TIMESTAMP_KEYS: &[&str] = &["date", "timestamp"];

/// Run rules in order and keep the first match.
fn first_match<T>(doc: &Document, rules: &[Rule<T>]) -> Option<T> {
    rules.iter().find_map(|rule| rule(doc))
}

/// Map a raw document onto a [`CanonicalEvent`].
///
/// Returns `None` when the document has no usable `id` or `url`. When a
/// date field is present but unreadable, `now` is used instead so that one
/// bad record does not hide the rest of the batch.
pub fn normalize_document(doc: &Document, now: DateTime<Utc>) -> Option<CanonicalEvent> {
    let id = first_match(doc, ID_RULES)?;
    let url = string_field(doc, "url")?;

    let timestamp = first_match(doc, TIMESTAMP_RULES).or_else(|| {
        TIMESTAMP_KEYS
            .iter()
            .any(|key| doc.get(*key).is_some_and(|v| !v.is_null()))
            .then_some(now)
    });

    Some(CanonicalEvent {
        id,
        url,
        timestamp,
        device_type: string_field(doc, "deviceType"),
        event_type: string_field(doc, "eventType"),
        user_agent: string_field(doc, "userAgent"),
        referrer: string_field(doc, "referrer"),
        screen_width: int_field(doc, "screenWidth"),
        screen_height: int_field(doc, "screenHeight"),
        language: string_field(doc, "language"),
        page_title: string_field(doc, "pageTitle"),
        load_time: doc.get("loadTime").and_then(long_value),
    })
}

// ============================================
// id rules
// ============================================

/// `{"_id": {"$oid": "..."}}`
fn object_id(doc: &Document) -> Option<String> {
    doc.get("_id")?
        .get("$oid")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `{"_id": "..."}`
fn string_id(doc: &Document) -> Option<String> {
    doc.get("_id")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `{"_id": 42}`
fn integer_id(doc: &Document) -> Option<String> {
    doc.get("_id")?.as_i64().map(|n| n.to_string())
}

/// `{"id": "..."}`
fn plain_id(doc: &Document) -> Option<String> {
    string_field(doc, "id").filter(|s| !s.is_empty())
}

// ============================================
// timestamp rules
// ============================================

fn native_date(doc: &Document) -> Option<DateTime<Utc>> {
    doc.get("date").and_then(native_datetime)
}

fn native_timestamp(doc: &Document) -> Option<DateTime<Utc>> {
    doc.get("timestamp").and_then(native_datetime)
}

fn string_date(doc: &Document) -> Option<DateTime<Utc>> {
    doc.get("date")
        .and_then(Value::as_str)
        .and_then(parse_date_string)
}

/// Extended-JSON date: `{"$date": "<rfc3339>"}`, `{"$date": <millis>}` or
/// `{"$date": {"$numberLong": "<millis>"}}`.
fn native_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let inner = value.as_object()?.get("$date")?;
    match inner {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(_) => inner.as_i64().and_then(millis_to_datetime),
        Value::Object(_) => long_value(inner).and_then(millis_to_datetime),
        _ => None,
    }
}

fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// RFC 3339 when the string carries a zone, else the leading
/// [`DATE_STRING_FORMAT`] part read as UTC. Trailing text after the seconds
/// (fractions, a `Z`) is ignored.
fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_and_remainder(s, DATE_STRING_FORMAT)
        .ok()
        .map(|(naive, _)| naive.and_utc())
}

// ============================================
// scalar fields
// ============================================

fn string_field(doc: &Document, key: &str) -> Option<String> {
    doc.get(key)?.as_str().map(str::to_string)
}

fn int_field(doc: &Document, key: &str) -> Option<i32> {
    let value = doc.get(key)?;
    let n = value
        .as_i64()
        .or_else(|| wrapped_number(value, "$numberInt"))?;
    i32::try_from(n).ok()
}

/// Integer stored natively or as `{"$numberLong"|"$numberInt": "<n>"}`.
fn long_value(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| wrapped_number(value, "$numberLong"))
        .or_else(|| wrapped_number(value, "$numberInt"))
}

fn wrapped_number(value: &Value, key: &str) -> Option<i64> {
    value.get(key)?.as_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_full_document() {
        let d = doc(json!({
            "_id": {"$oid": "65f1c0ffee00000000000001"},
            "url": "/pricing",
            "date": {"$date": "2024-05-31T08:30:00Z"},
            "userAgent": "Mozilla/5.0",
            "referrer": "https://search.example",
            "deviceType": "Mobile",
            "screenWidth": 390,
            "screenHeight": 844,
            "language": "fr-FR",
            "eventType": "page_view",
            "pageTitle": "Pricing",
            "loadTime": 812
        }));

        let event = normalize_document(&d, now()).unwrap();
        assert_eq!(event.id, "65f1c0ffee00000000000001");
        assert_eq!(event.url, "/pricing");
        assert_eq!(
            event.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 5, 31, 8, 30, 0).unwrap())
        );
        assert_eq!(event.device_type.as_deref(), Some("Mobile"));
        assert_eq!(event.screen_width, Some(390));
        assert_eq!(event.screen_height, Some(844));
        assert_eq!(event.language.as_deref(), Some("fr-FR"));
        assert_eq!(event.event_type.as_deref(), Some("page_view"));
        assert_eq!(event.page_title.as_deref(), Some("Pricing"));
        assert_eq!(event.load_time, Some(812));
    }

    #[test]
    fn test_missing_id_or_url_is_dropped() {
        assert!(normalize_document(&doc(json!({"url": "/a"})), now()).is_none());
        assert!(normalize_document(&doc(json!({"_id": "x"})), now()).is_none());
        // url of the wrong type counts as missing
        assert!(normalize_document(&doc(json!({"_id": "x", "url": 7})), now()).is_none());
        // empty ids are unusable
        assert!(normalize_document(&doc(json!({"_id": "", "url": "/a"})), now()).is_none());
    }

    #[test]
    fn test_id_rules_in_order() {
        let oid = doc(json!({"_id": {"$oid": "abc"}, "id": "ignored", "url": "/"}));
        assert_eq!(normalize_document(&oid, now()).unwrap().id, "abc");

        let string = doc(json!({"_id": "evt-1", "url": "/"}));
        assert_eq!(normalize_document(&string, now()).unwrap().id, "evt-1");

        let integer = doc(json!({"_id": 42, "url": "/"}));
        assert_eq!(normalize_document(&integer, now()).unwrap().id, "42");

        let plain = doc(json!({"id": "legacy-7", "url": "/"}));
        assert_eq!(normalize_document(&plain, now()).unwrap().id, "legacy-7");
    }

    #[test]
    fn test_timestamp_rules_in_order() {
        let both = doc(json!({
            "_id": "a", "url": "/",
            "date": {"$date": "2024-01-01T00:00:00Z"},
            "timestamp": {"$date": "2023-01-01T00:00:00Z"}
        }));
        assert_eq!(
            normalize_document(&both, now()).unwrap().timestamp,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );

        let ts_only = doc(json!({
            "_id": "a", "url": "/",
            "timestamp": {"$date": 1_700_000_000_000i64}
        }));
        assert_eq!(
            normalize_document(&ts_only, now()).unwrap().timestamp,
            Some(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap())
        );

        let number_long = doc(json!({
            "_id": "a", "url": "/",
            "date": {"$date": {"$numberLong": "1700000000000"}}
        }));
        assert_eq!(
            normalize_document(&number_long, now()).unwrap().timestamp,
            Some(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap())
        );

        let string_date = doc(json!({"_id": "a", "url": "/", "date": "2024-02-29T23:59:01"}));
        assert_eq!(
            normalize_document(&string_date, now()).unwrap().timestamp,
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 1).unwrap())
        );
    }

    #[test]
    fn test_string_dates_with_suffixes() {
        let expected = Some(Utc.with_ymd_and_hms(2024, 5, 31, 8, 30, 0).unwrap());
        let date = |s: &str| {
            normalize_document(&doc(json!({"_id": "a", "url": "/", "date": s})), now())
                .unwrap()
                .timestamp
        };

        // Browser `toISOString()` output
        assert_eq!(date("2024-05-31T08:30:00.000Z"), expected);
        assert_eq!(date("2024-05-31T08:30:00Z"), expected);
        assert_eq!(date("2024-05-31T10:30:00+02:00"), expected);
        // Unknown trailing text after the seconds
        assert_eq!(date("2024-05-31T08:30:00.123456"), expected);
        // Truncated before the seconds is still unreadable
        assert_eq!(date("2024-05-31T08:30"), Some(now()));
    }

    #[test]
    fn test_unparseable_date_falls_back_to_now() {
        let bad = doc(json!({"_id": "a", "url": "/", "date": "31/12/2024"}));
        assert_eq!(normalize_document(&bad, now()).unwrap().timestamp, Some(now()));

        let bad_native = doc(json!({"_id": "a", "url": "/", "timestamp": {"$date": true}}));
        assert_eq!(
            normalize_document(&bad_native, now()).unwrap().timestamp,
            Some(now())
        );
    }

    #[test]
    fn test_absent_date_stays_absent() {
        let undated = doc(json!({"_id": "a", "url": "/"}));
        assert!(normalize_document(&undated, now()).unwrap().timestamp.is_none());

        let null_date = doc(json!({"_id": "a", "url": "/", "date": null}));
        assert!(normalize_document(&null_date, now()).unwrap().timestamp.is_none());
    }

    #[test]
    fn test_mistyped_optional_fields_are_dropped() {
        let d = doc(json!({
            "_id": "a", "url": "/",
            "deviceType": 3,
            "screenWidth": "wide",
            "screenHeight": 10_000_000_000i64,
            "loadTime": {"$numberLong": "4200"}
        }));
        let event = normalize_document(&d, now()).unwrap();
        assert!(event.device_type.is_none());
        assert!(event.screen_width.is_none());
        assert!(event.screen_height.is_none());
        assert_eq!(event.load_time, Some(4200));
    }
}
