#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geographic value types for the civic portal map layer.
//!
//! Markers, crime reports, and drawn shapes all flow through these types.
//! Coordinates are WGS84 floating-point degrees. Persistence-facing shapes
//! (field names, tag values) match the stored document format so the
//! gateway can serialize them directly.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Well-known marker category tags.
///
/// Categories are free text on the wire; these are the values the portal
/// itself assigns and styles.
pub mod category {
    /// Crime reports projected onto the map.
    pub const CRIME: &str = "crime";
    /// Border-area markers.
    pub const BORDER: &str = "border";
    /// Tourism points of interest.
    pub const TOURISM: &str = "tourism";
}

/// Default status assigned to a newly filed crime report.
pub const PENDING_INVESTIGATION: &str = "Pending Investigation";

/// A geographic point in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees, valid range [-90, 90].
    pub lat: f64,
    /// Longitude in degrees, valid range [-180, 180].
    pub lng: f64,
}

impl LatLng {
    /// Creates a new point from latitude and longitude degrees.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both coordinates are inside the WGS84 valid ranges.
    #[must_use]
    pub fn in_bounds(self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Whether this point coincides with `other` within `epsilon` degrees
    /// on both axes.
    #[must_use]
    pub fn coincides(self, other: Self, epsilon: f64) -> bool {
        (self.lat - other.lat).abs() < epsilon && (self.lng - other.lng).abs() < epsilon
    }
}

/// A single geotagged point shown on the map.
///
/// `id` is absent until the document store assigns one; locally created
/// markers live in the in-memory state with `id: None` until the
/// asynchronous persist completes and backfills it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Document id, absent until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display title.
    pub title: String,
    /// Free-text category tag ("tourism", "crime", "border", ...).
    pub category: String,
    /// Geographic position.
    pub position: LatLng,
    /// Optional image shown as a circular overlay instead of the default
    /// marker glyph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Creation timestamp in host-local wall-clock time. `None` marks
    /// undated legacy data, which every date filter includes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

/// Identity of the person filing a crime report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reporter {
    /// Account id, or the `"anonymous"` sentinel.
    pub user_id: String,
    /// Display name.
    pub name: String,
}

impl Reporter {
    /// The anonymous sentinel used when no account is attached.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            name: "Anonymous".to_string(),
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// A filed crime report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeReport {
    /// Document id, absent until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Report headline.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Crime type label (free text).
    pub crime_type: String,
    /// Report time as epoch milliseconds.
    pub timestamp: i64,
    /// Report location. Stored documents use several field-name
    /// conventions; the gateway decode layer normalizes them into this.
    pub location: LatLng,
    /// Street address text.
    pub address: String,
    /// Who filed the report.
    pub reported_by: Reporter,
    /// Workflow status, defaults to [`PENDING_INVESTIGATION`].
    pub status: String,
    /// Attachment URLs (uploaded images).
    pub attachments: Vec<String>,
}

impl CrimeReport {
    /// Projects this report into a marker for map display.
    ///
    /// Category is fixed to `"crime"`; the title falls back to the crime
    /// type, then a generic label; the first attachment becomes the
    /// marker image.
    #[must_use]
    pub fn to_marker(&self) -> Marker {
        let title = if self.title.is_empty() {
            if self.crime_type.is_empty() {
                "Crime reported".to_string()
            } else {
                self.crime_type.clone()
            }
        } else {
            self.title.clone()
        };

        Marker {
            id: self.id.clone(),
            title,
            category: category::CRIME.to_string(),
            position: self.location,
            image_url: self.attachments.first().cloned(),
            created_at: chrono::DateTime::from_timestamp_millis(self.timestamp)
                .map(|dt| dt.naive_utc()),
        }
    }
}

/// A persisted drawn shape, rendered as a static (non-interactive) map
/// overlay.
///
/// Shapes are created once from a completed drawing and loaded at map
/// initialization; no update or delete path exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// A circle around a center point, radius in meters.
    Circle {
        /// Center of the circle.
        center: LatLng,
        /// Radius in meters.
        radius: f64,
    },
    /// A closed region. The path retains its closing vertex.
    Polygon {
        /// Ordered vertices.
        path: Vec<LatLng>,
    },
    /// An open path.
    Polyline {
        /// Ordered vertices.
        path: Vec<LatLng>,
    },
    /// An axis-aligned rectangle stored as its two opposite corners.
    Rectangle {
        /// `[south_west, north_east]` corners.
        path: [LatLng; 2],
    },
}

impl Shape {
    /// The south-west corner for rectangles, `None` otherwise.
    #[must_use]
    pub const fn south_west(&self) -> Option<LatLng> {
        match self {
            Self::Rectangle { path } => Some(path[0]),
            _ => None,
        }
    }

    /// The north-east corner for rectangles, `None` otherwise.
    #[must_use]
    pub const fn north_east(&self) -> Option<LatLng> {
        match self {
            Self::Rectangle { path } => Some(path[1]),
            _ => None,
        }
    }
}

/// In-progress user input for filing a marker or crime report.
///
/// Ephemeral: never persisted as its own entity. On save it converts into
/// a [`Marker`], a [`CrimeReport`], or a [`Shape`], and is then discarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDraft {
    /// Report title; empty falls back to a generic label on save.
    pub title: String,
    /// Marker category; `None` falls back to the page's selected type.
    pub category: Option<String>,
    /// Explicit point, set by map clicks.
    pub lat: Option<f64>,
    /// Explicit point, set by map clicks.
    pub lng: Option<f64>,
    /// Textual location encoding, set by the drawing tools or typed
    /// manually. Takes precedence over `lat`/`lng` when parseable.
    pub location_text: Option<String>,
    /// Crime description.
    pub description: Option<String>,
    /// Crime type label.
    pub crime_type: Option<String>,
    /// Street address text.
    pub address: Option<String>,
    /// Uploaded attachment URLs.
    pub attachments: Vec<String>,
    /// Explicit marker image URL; the first attachment wins over this.
    pub image_url: Option<String>,
    /// Who is filing.
    pub reported_by: Option<Reporter>,
}

impl ReportDraft {
    /// The marker image for this draft: first attachment, else the
    /// explicit image URL. Empty strings count as absent.
    #[must_use]
    pub fn effective_image_url(&self) -> Option<String> {
        self.attachments
            .first()
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                self.image_url
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
            })
            .map(str::to_string)
    }
}
