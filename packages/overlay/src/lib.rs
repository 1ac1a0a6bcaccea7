#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Custom marker overlays: circular-image icons with a category-colored
//! ring, hover labels, and the pixel projection used to place them.
//!
//! Markers carrying an image URL are rendered as a circular cutout of the
//! image inside a colored ring instead of the SDK's default glyph. Icons
//! are emitted as standalone SVG documents and cached by
//! `(image_url, category)` — the hover label is part of the overlay
//! descriptor, not the icon, so identical images share one rendering.

mod cache;
mod icon;
mod projection;

pub use cache::IconCache;
pub use icon::{ICON_SIZE, render_circular_icon};
pub use projection::project;

use std::sync::Arc;

use civic_portal_geo_models::{LatLng, Marker, category};

/// Ring and label color for a marker category.
///
/// Crime and border markers are red, tourism green, everything else the
/// portal's violet.
#[must_use]
pub fn category_color(marker_category: &str) -> &'static str {
    match marker_category {
        category::CRIME | category::BORDER => "#ef4444",
        category::TOURISM => "#10b981",
        _ => "#7c3aed",
    }
}

/// One positioned overlay: the icon plus its hover label.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayDescriptor {
    /// The marker this overlay belongs to, when persisted.
    pub marker_id: Option<String>,
    /// Geographic position.
    pub position: LatLng,
    /// Label text, shown only while hovered.
    pub label: String,
    /// Category color shared by the ring and the label band.
    pub color: &'static str,
    /// Rendered SVG icon (shared with the cache).
    pub icon_svg: Arc<String>,
}

impl OverlayDescriptor {
    /// World-pixel position of the overlay's top-left corner at a zoom
    /// level, offset so the icon is centered on the marker.
    #[must_use]
    pub fn pixel_origin(&self, zoom: u8) -> (f64, f64) {
        let (x, y) = project(self.position, zoom);
        let half = f64::from(ICON_SIZE) / 2.0;
        (x - half, y - half)
    }
}

/// The overlay layer for the currently visible markers.
///
/// Rebuilt from scratch whenever the visible set changes — there is no
/// incremental diffing. Icon renderings themselves survive rebuilds via
/// the [`IconCache`].
#[derive(Default)]
pub struct OverlaySet {
    overlays: Vec<OverlayDescriptor>,
    generation: u64,
}

impl OverlaySet {
    /// Creates an empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current overlays.
    #[must_use]
    pub fn overlays(&self) -> &[OverlayDescriptor] {
        &self.overlays
    }

    /// The marker-store generation this layer was last rebuilt for.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Rebuilds the layer from the visible markers.
    ///
    /// Only markers carrying an image URL get an overlay; the rest keep
    /// the SDK's default glyph.
    pub fn rebuild(&mut self, visible: &[Marker], generation: u64, icons: &IconCache) {
        self.overlays = visible
            .iter()
            .filter_map(|marker| {
                let image_url = marker.image_url.as_deref()?;
                let color = category_color(&marker.category);
                Some(OverlayDescriptor {
                    marker_id: marker.id.clone(),
                    position: marker.position,
                    label: marker.title.clone(),
                    color,
                    icon_svg: icons.icon(image_url, &marker.category),
                })
            })
            .collect();
        self.generation = generation;
        log::debug!(
            "overlay layer rebuilt: {} image overlays (generation {generation})",
            self.overlays.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: &str, title: &str, image: Option<&str>, cat: &str) -> Marker {
        Marker {
            id: Some(id.to_string()),
            title: title.to_string(),
            category: cat.to_string(),
            position: LatLng::new(11.5564, 104.9282),
            image_url: image.map(str::to_string),
            created_at: None,
        }
    }

    #[test]
    fn palette_matches_categories() {
        assert_eq!(category_color("crime"), "#ef4444");
        assert_eq!(category_color("border"), "#ef4444");
        assert_eq!(category_color("tourism"), "#10b981");
        assert_eq!(category_color("other"), "#7c3aed");
        assert_eq!(category_color(""), "#7c3aed");
    }

    #[test]
    fn rebuild_only_includes_image_markers() {
        let icons = IconCache::new();
        let mut layer = OverlaySet::new();

        layer.rebuild(
            &[
                marker("a", "With image", Some("https://cdn.example/a.jpg"), "tourism"),
                marker("b", "No image", None, "tourism"),
            ],
            3,
            &icons,
        );

        assert_eq!(layer.overlays().len(), 1);
        assert_eq!(layer.overlays()[0].marker_id.as_deref(), Some("a"));
        assert_eq!(layer.generation(), 3);
    }

    #[test]
    fn rebuild_reuses_cached_icons() {
        let icons = IconCache::new();
        let mut layer = OverlaySet::new();
        let markers = [
            marker("a", "One", Some("https://cdn.example/a.jpg"), "crime"),
            marker("b", "Two", Some("https://cdn.example/a.jpg"), "crime"),
        ];

        layer.rebuild(&markers, 1, &icons);
        assert_eq!(icons.len(), 1);
        assert!(Arc::ptr_eq(
            &layer.overlays()[0].icon_svg,
            &layer.overlays()[1].icon_svg
        ));

        layer.rebuild(&markers, 2, &icons);
        assert_eq!(icons.len(), 1);
    }

    #[test]
    fn pixel_origin_centers_the_icon() {
        let icons = IconCache::new();
        let mut layer = OverlaySet::new();
        layer.rebuild(
            &[marker("a", "One", Some("https://cdn.example/a.jpg"), "tourism")],
            1,
            &icons,
        );

        let overlay = &layer.overlays()[0];
        let (cx, cy) = project(overlay.position, 12);
        let (ox, oy) = overlay.pixel_origin(12);
        assert!((cx - ox - 24.0).abs() < f64::EPSILON);
        assert!((cy - oy - 24.0).abs() < f64::EPSILON);
    }
}
