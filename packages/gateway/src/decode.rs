//! Canonical decoding of raw documents.
//!
//! This is the single place where stored JSON becomes typed records.
//! Collections have accumulated drift — field renames, several timestamp
//! encodings, two article snapshot shapes — and historically each reader
//! patched over it with scattered `field ?? default` fallbacks. Here the
//! rules are explicit: optional fields take the documented default,
//! required fields that are missing or malformed produce a
//! [`DecodeError`], and nothing is silently half-defaulted.
//!
//! Accepted timestamp encodings: RFC 3339 strings, naive
//! `YYYY-MM-DDTHH:MM:SS[.fff]` strings, epoch milliseconds, epoch
//! seconds, and `{seconds, nanoseconds}` maps.

use chrono::NaiveDateTime;
use civic_portal_content_models::{
    ArticleStatus, ContentItem, ContentKind, NewsArticle, PortalUser, UserRole,
};
use civic_portal_geo_models::{CrimeReport, LatLng, Marker, Reporter, Shape};
use serde_json::Value;

use crate::Document;

/// Default marker category when a document carries none.
const DEFAULT_MARKER_CATEGORY: &str = "other";

/// A document that cannot be decoded into its canonical record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// A required field is absent.
    #[error("Missing required field `{field}`")]
    MissingField {
        /// Field name.
        field: &'static str,
    },

    /// A field is present but unusable.
    #[error("Invalid field `{field}`: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Coordinates outside the WGS84 valid ranges.
    #[error("Coordinates out of range: lat {lat}, lng {lng}")]
    OutOfRange {
        /// Offending latitude.
        lat: f64,
        /// Offending longitude.
        lng: f64,
    },
}

/// Decodes a marker document.
///
/// Accepts the legacy `type` key for the category and any supported
/// timestamp encoding for `createdAt`. The position is required and must
/// be in range.
///
/// # Errors
///
/// Returns [`DecodeError`] if the position is missing, malformed, or out
/// of range, or a present timestamp is unreadable.
pub fn decode_marker(doc: &Document) -> Result<Marker, DecodeError> {
    let value = &doc.value;

    let position = extract_latlng(value.get("position").unwrap_or(&Value::Null))
        .ok_or(DecodeError::MissingField { field: "position" })?;
    validate_bounds(position)?;

    Ok(Marker {
        id: Some(doc.id.clone()),
        title: str_or(value, "title", "Untitled"),
        category: value
            .get("category")
            .or_else(|| value.get("type"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_MARKER_CATEGORY)
            .to_string(),
        position,
        image_url: opt_str(value, "imageUrl"),
        created_at: timestamp_field(value, "createdAt")?,
    })
}

/// Decodes a crime report document.
///
/// The location is extracted tolerantly (`{latitude, longitude}`,
/// `{lat, lng}`, `{_lat, _long}`, or one level of nesting) and is
/// required. A missing timestamp defaults to `now`.
///
/// # Errors
///
/// Returns [`DecodeError`] if no usable location is present or the
/// coordinates are out of range.
pub fn decode_crime_report(doc: &Document, now: NaiveDateTime) -> Result<CrimeReport, DecodeError> {
    let value = &doc.value;

    let location = extract_latlng(value.get("location").unwrap_or(&Value::Null))
        .ok_or(DecodeError::MissingField { field: "location" })?;
    validate_bounds(location)?;

    let timestamp = match value.get("timestamp").and_then(Value::as_i64) {
        Some(ms) if ms > 0 => ms,
        _ => now.and_utc().timestamp_millis(),
    };

    let reported_by = value
        .get("reportedBy")
        .map_or_else(Reporter::anonymous, |v| Reporter {
            user_id: str_or(v, "userId", "anonymous"),
            name: str_or(v, "name", "Anonymous"),
        });

    Ok(CrimeReport {
        id: Some(doc.id.clone()),
        title: str_or(value, "title", ""),
        description: str_or(value, "description", ""),
        crime_type: str_or(value, "crimeType", "Unknown"),
        timestamp,
        location,
        address: str_or(value, "address", ""),
        reported_by,
        status: str_or(value, "status", civic_portal_geo_models::PENDING_INVESTIGATION),
        attachments: string_list(value, "attachments"),
    })
}

/// Decodes a shape document (`{type: circle|polygon|polyline|rectangle, ...}`).
///
/// # Errors
///
/// Returns [`DecodeError::InvalidField`] if the tagged shape form does not
/// match (e.g. a rectangle path without exactly two corners).
pub fn decode_shape(doc: &Document) -> Result<Shape, DecodeError> {
    serde_json::from_value(doc.value.clone()).map_err(|e| DecodeError::InvalidField {
        field: "shape",
        reason: e.to_string(),
    })
}

/// Decodes a news article document, accepting both historical snapshot
/// shapes (excerpt-style `summary` and the political-analysis fields) and
/// both `*At` / `*Date` timestamp key spellings.
///
/// # Errors
///
/// Returns [`DecodeError`] if a present status or timestamp field is
/// unreadable.
pub fn decode_article(doc: &Document, now: NaiveDateTime) -> Result<NewsArticle, DecodeError> {
    let value = &doc.value;

    let status = match value.get("status").and_then(Value::as_str) {
        None => ArticleStatus::Draft,
        Some(s) => s.parse().map_err(|_| DecodeError::InvalidField {
            field: "status",
            reason: format!("unknown status `{s}`"),
        })?,
    };

    Ok(NewsArticle {
        id: Some(doc.id.clone()),
        title: str_or(value, "title", "Untitled"),
        content: str_or(value, "content", ""),
        author: str_or(value, "author", "Unknown"),
        category: str_or(value, "category", "General"),
        status,
        tags: string_list(value, "tags"),
        featured_image: opt_str(value, "featuredImage"),
        created_at: first_timestamp(value, &["createdAt", "createdDate"])?.unwrap_or(now),
        updated_at: first_timestamp(value, &["updatedAt", "updatedDate"])?.unwrap_or(now),
        published_at: first_timestamp(value, &["publishedAt", "publishedDate"])?,
        views: value.get("views").and_then(Value::as_u64).unwrap_or(0),
        summary: opt_str(value, "summary"),
        political_perspective: opt_str(value, "politicalPerspective")
            .or_else(|| opt_str(value, "political_perspective")),
        regional_impact: opt_str(value, "regionalImpact")
            .or_else(|| opt_str(value, "regional_impact")),
    })
}

/// Decodes a portal user document.
///
/// # Errors
///
/// Returns [`DecodeError`] if a present role or timestamp field is
/// unreadable.
pub fn decode_user(doc: &Document, now: NaiveDateTime) -> Result<PortalUser, DecodeError> {
    let value = &doc.value;

    let role = match value.get("role").and_then(Value::as_str) {
        None => UserRole::User,
        Some(s) => s.parse().map_err(|_| DecodeError::InvalidField {
            field: "role",
            reason: format!("unknown role `{s}`"),
        })?,
    };

    Ok(PortalUser {
        id: Some(doc.id.clone()),
        email: str_or(value, "email", ""),
        username: str_or(value, "username", ""),
        role,
        created_at: timestamp_field(value, "createdAt")?.unwrap_or(now),
        last_active: timestamp_field(value, "lastActive")?,
        is_active: value.get("isActive").and_then(Value::as_bool).unwrap_or(true),
    })
}

/// Decodes a generic content item document, accepting the legacy `type`
/// key for the kind.
///
/// # Errors
///
/// Returns [`DecodeError`] if a present kind, status, or timestamp field
/// is unreadable.
pub fn decode_content_item(doc: &Document, now: NaiveDateTime) -> Result<ContentItem, DecodeError> {
    let value = &doc.value;

    let kind = match value
        .get("kind")
        .or_else(|| value.get("type"))
        .and_then(Value::as_str)
    {
        None => ContentKind::News,
        Some(s) => s.parse().map_err(|_| DecodeError::InvalidField {
            field: "kind",
            reason: format!("unknown kind `{s}`"),
        })?,
    };

    let status = match value.get("status").and_then(Value::as_str) {
        None => ArticleStatus::Draft,
        Some(s) => s.parse().map_err(|_| DecodeError::InvalidField {
            field: "status",
            reason: format!("unknown status `{s}`"),
        })?,
    };

    Ok(ContentItem {
        id: Some(doc.id.clone()),
        title: str_or(value, "title", "Untitled"),
        kind,
        status,
        author: str_or(value, "author", "Unknown"),
        created_at: timestamp_field(value, "createdAt")?.unwrap_or(now),
        updated_at: timestamp_field(value, "updatedAt")?,
        view_count: value.get("viewCount").and_then(Value::as_u64).unwrap_or(0),
    })
}

/// Extracts a coordinate pair from any of the legacy location encodings.
///
/// Tries `{latitude, longitude}`, `{lat, lng}`, `{_lat, _long}`, then one
/// level of `{location: {...}}` nesting. Returns `None` when nothing
/// matches.
#[must_use]
pub fn extract_latlng(value: &Value) -> Option<LatLng> {
    for (lat_key, lng_key) in [("latitude", "longitude"), ("lat", "lng"), ("_lat", "_long")] {
        if let (Some(lat), Some(lng)) = (
            value.get(lat_key).and_then(Value::as_f64),
            value.get(lng_key).and_then(Value::as_f64),
        ) {
            return Some(LatLng::new(lat, lng));
        }
    }
    value.get("location").and_then(extract_latlng)
}

fn validate_bounds(point: LatLng) -> Result<(), DecodeError> {
    if point.in_bounds() {
        Ok(())
    } else {
        Err(DecodeError::OutOfRange {
            lat: point.lat,
            lng: point.lng,
        })
    }
}

fn str_or(value: &Value, key: &str, default: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn opt_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Reads one timestamp field; absent or null yields `None`.
fn timestamp_field(
    value: &Value,
    field: &'static str,
) -> Result<Option<NaiveDateTime>, DecodeError> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => decode_timestamp(raw)
            .map(Some)
            .map_err(|reason| DecodeError::InvalidField { field, reason }),
    }
}

/// Reads the first present timestamp among several key spellings.
fn first_timestamp(
    value: &Value,
    fields: &[&'static str],
) -> Result<Option<NaiveDateTime>, DecodeError> {
    for field in fields {
        if let Some(ts) = timestamp_field(value, field)? {
            return Ok(Some(ts));
        }
    }
    Ok(None)
}

/// Decodes one timestamp value in any supported encoding.
fn decode_timestamp(raw: &Value) -> Result<NaiveDateTime, String> {
    match raw {
        Value::String(s) => {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                return Ok(naive);
            }
            if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
                return Ok(dt.naive_utc());
            }
            Err(format!("unparseable timestamp string `{s}`"))
        }
        Value::Number(_) => {
            let n = raw
                .as_i64()
                .ok_or_else(|| "non-integer numeric timestamp".to_string())?;
            // Millisecond timestamps are 12+ digits for any modern date;
            // anything smaller is epoch seconds.
            let dt = if n.abs() >= 100_000_000_000 {
                chrono::DateTime::from_timestamp_millis(n)
            } else {
                chrono::DateTime::from_timestamp(n, 0)
            };
            dt.map(|d| d.naive_utc())
                .ok_or_else(|| format!("numeric timestamp {n} out of range"))
        }
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .and_then(Value::as_i64)
                .ok_or_else(|| "timestamp object without `seconds`".to_string())?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("nanos"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).map_err(|_| "nanoseconds out of range".to_string())?;
            chrono::DateTime::from_timestamp(seconds, nanos)
                .map(|d| d.naive_utc())
                .ok_or_else(|| format!("timestamp seconds {seconds} out of range"))
        }
        other => Err(format!("unsupported timestamp encoding: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document {
            id: "d1".to_string(),
            version: 1,
            value,
        }
    }

    fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2025, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn marker_accepts_legacy_type_key() {
        let marker = decode_marker(&doc(json!({
            "title": "Riverside",
            "type": "tourism",
            "position": {"lat": 11.5564, "lng": 104.9282},
            "createdAt": "2025-06-10T08:00:00",
        })))
        .unwrap();
        assert_eq!(marker.category, "tourism");
        assert_eq!(marker.id.as_deref(), Some("d1"));
        assert!(marker.created_at.is_some());
    }

    #[test]
    fn marker_without_position_is_rejected() {
        let err = decode_marker(&doc(json!({"title": "nowhere"}))).unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "position" });
    }

    #[test]
    fn marker_with_out_of_range_position_is_rejected() {
        let err = decode_marker(&doc(json!({
            "title": "bad",
            "position": {"lat": 95.0, "lng": 0.0},
        })))
        .unwrap_err();
        assert!(matches!(err, DecodeError::OutOfRange { .. }));
    }

    #[test]
    fn crime_location_field_conventions_all_decode() {
        for location in [
            json!({"latitude": 11.5, "longitude": 104.9}),
            json!({"lat": 11.5, "lng": 104.9}),
            json!({"_lat": 11.5, "_long": 104.9}),
            json!({"location": {"lat": 11.5, "lng": 104.9}}),
        ] {
            let report = decode_crime_report(
                &doc(json!({"title": "t", "location": location})),
                now(),
            )
            .unwrap();
            assert!((report.location.lat - 11.5).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn crime_defaults_follow_the_documented_sentinels() {
        let report = decode_crime_report(
            &doc(json!({"location": {"lat": 1.0, "lng": 2.0}})),
            now(),
        )
        .unwrap();
        assert_eq!(report.status, "Pending Investigation");
        assert_eq!(report.reported_by.user_id, "anonymous");
        assert_eq!(report.crime_type, "Unknown");
        assert_eq!(report.timestamp, now().and_utc().timestamp_millis());
    }

    #[test]
    fn crime_without_location_is_rejected_not_defaulted() {
        let err = decode_crime_report(&doc(json!({"title": "t"})), now()).unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "location" });
    }

    #[test]
    fn article_accepts_both_snapshot_variants() {
        let excerpt = decode_article(
            &doc(json!({
                "title": "A",
                "status": "published",
                "publishedDate": {"seconds": 1_750_000_000, "nanoseconds": 0},
                "summary": "short teaser",
            })),
            now(),
        )
        .unwrap();
        assert_eq!(excerpt.summary.as_deref(), Some("short teaser"));
        assert!(excerpt.published_at.is_some());

        let political = decode_article(
            &doc(json!({
                "title": "B",
                "political_perspective": "neutral",
                "regional_impact": "regional trade",
            })),
            now(),
        )
        .unwrap();
        assert_eq!(political.political_perspective.as_deref(), Some("neutral"));
        assert_eq!(political.regional_impact.as_deref(), Some("regional trade"));
        assert_eq!(political.status, ArticleStatus::Draft);
        assert_eq!(political.created_at, now());
    }

    #[test]
    fn unknown_article_status_is_an_error_not_a_default() {
        let err = decode_article(&doc(json!({"status": "live"})), now()).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "status", .. }));
    }

    #[test]
    fn timestamp_encodings_agree() {
        let value = json!({
            "a": "2025-06-15T12:00:00",
            "b": 1_749_988_800_000_i64,
            "c": 1_749_988_800_i64,
            "d": {"seconds": 1_749_988_800, "nanoseconds": 0},
        });
        let a = timestamp_field(&value, "a").unwrap().unwrap();
        let b = timestamp_field(&value, "b").unwrap().unwrap();
        let c = timestamp_field(&value, "c").unwrap().unwrap();
        let d = timestamp_field(&value, "d").unwrap().unwrap();
        assert_eq!(b, c);
        assert_eq!(c, d);
        assert_eq!(a, b);
    }

    #[test]
    fn rectangle_shape_requires_two_corners() {
        let ok = decode_shape(&doc(json!({
            "type": "rectangle",
            "path": [{"lat": 11.0, "lng": 104.0}, {"lat": 12.0, "lng": 105.0}],
        })));
        assert!(ok.is_ok());

        let bad = decode_shape(&doc(json!({
            "type": "rectangle",
            "path": [{"lat": 11.0, "lng": 104.0}],
        })));
        assert!(bad.is_err());
    }

    #[test]
    fn content_item_accepts_legacy_type_key() {
        let item = decode_content_item(
            &doc(json!({"title": "Notice", "type": "announcement", "status": "published"})),
            now(),
        )
        .unwrap();
        assert_eq!(item.kind, ContentKind::Announcement);
    }
}
