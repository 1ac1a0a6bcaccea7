#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Parser and formatter for the textual location encoding used by report
//! drafts.
//!
//! The encoding is a best-effort format, not a strict grammar: one
//! `lat,lng` pair for a point, or several pairs joined by `;` for a
//! multi-point shape. Malformed segments are dropped rather than rejected,
//! so hand-typed input with stray text still yields whatever coordinates
//! it contains.
//!
//! Shape disambiguation for multi-point input:
//!
//! - exactly 2 pairs → rectangle (opposite corners)
//! - 3+ pairs whose first and last coincide → polygon
//! - anything else → polyline
//!
//! The 2-pair rectangle rule is load-bearing: stored location text already
//! encodes rectangles as two corners, so a 2-vertex line cannot be
//! expressed. See `parses_two_pairs_as_rectangle_never_polyline`.

use std::fmt::Write as _;
use std::sync::LazyLock;

use civic_portal_geo_models::LatLng;
use regex::Regex;

/// Matches one `lat,lng` pair of optionally signed decimals anywhere in a
/// segment.
static PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)").expect("valid regex")
});

/// Two points this close (degrees, per axis) count as coincident when
/// testing for a closed polygon.
pub const CLOSURE_EPSILON: f64 = 1e-4;

/// A location decoded from text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLocation {
    /// A single point.
    Point(LatLng),
    /// A closed region (closing vertex retained).
    Polygon(Vec<LatLng>),
    /// An open path.
    Polyline(Vec<LatLng>),
    /// Opposite corners of a rectangle.
    Rectangle(LatLng, LatLng),
}

/// Parses a textual location encoding.
///
/// Returns `None` when the text contains no valid coordinate pair; callers
/// treat that as "no location" and skip the save.
#[must_use]
pub fn parse_location(text: &str) -> Option<ParsedLocation> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let points: Vec<LatLng> = trimmed
        .split(';')
        .filter_map(|segment| {
            let caps = PAIR_RE.captures(segment)?;
            let lat = caps[1].parse::<f64>().ok()?;
            let lng = caps[2].parse::<f64>().ok()?;
            Some(LatLng::new(lat, lng))
        })
        .collect();

    if points.is_empty() {
        return None;
    }
    if let [point] = *points.as_slice() {
        return Some(ParsedLocation::Point(point));
    }
    if let [a, b] = *points.as_slice() {
        return Some(ParsedLocation::Rectangle(a, b));
    }

    let closed = points
        .first()
        .zip(points.last())
        .is_some_and(|(first, last)| first.coincides(*last, CLOSURE_EPSILON));

    if closed {
        Some(ParsedLocation::Polygon(points))
    } else {
        Some(ParsedLocation::Polyline(points))
    }
}

/// Formats a parsed location back into the textual encoding.
///
/// Coordinates are written with six decimal places; pairs are joined by
/// `"; "`. `parse_location(&format_location(loc))` yields an equivalent
/// location for every value this module produces.
#[must_use]
pub fn format_location(location: &ParsedLocation) -> String {
    match location {
        ParsedLocation::Point(p) => format_pair(*p),
        ParsedLocation::Polygon(path) | ParsedLocation::Polyline(path) => format_pairs(path),
        ParsedLocation::Rectangle(sw, ne) => format_pairs(&[*sw, *ne]),
    }
}

/// Formats a single coordinate pair (`"lat,lng"`, six decimal places).
#[must_use]
pub fn format_pair(point: LatLng) -> String {
    format!("{:.6},{:.6}", point.lat, point.lng)
}

/// Formats a list of coordinate pairs joined by `"; "`.
#[must_use]
pub fn format_pairs(points: &[LatLng]) -> String {
    let mut out = String::new();
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        let _ = write!(out, "{:.6},{:.6}", point.lat, point.lng);
    }
    out
}
