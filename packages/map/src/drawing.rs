//! Drawing-tool coordination.
//!
//! The map SDK's drawing manager is an opaque collaborator behind
//! [`DrawingSurface`]. The coordinator owns the `idle → drawing(mode) →
//! idle` state machine, keeps at most one uncommitted overlay alive, and
//! translates completed shapes into the report draft's textual location
//! encoding.
//!
//! When the drawing library fails to load, the coordinator is constructed
//! without a surface: arming becomes a silent no-op and no shapes can be
//! authored by drawing, but typing coordinates into the location text
//! field still works.

use civic_portal_geo_models::{LatLng, ReportDraft};
use civic_portal_location::{format_pair, format_pairs};
use strum_macros::{AsRefStr, Display, EnumString};

/// Handle to an overlay object living inside the map SDK.
pub type OverlayId = u64;

/// The drawing modes offered by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum DrawMode {
    /// Drop a point marker.
    Marker,
    /// Drag out a circle.
    Circle,
    /// Click out a closed region.
    Polygon,
    /// Click out an open path.
    Polyline,
    /// Drag out a rectangle.
    Rectangle,
}

/// A shape completed by the drawing manager, in SDK-independent terms.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawnShape {
    /// A dropped point marker.
    Point(LatLng),
    /// A dragged circle.
    Circle {
        /// Center of the circle.
        center: LatLng,
        /// Radius in meters.
        radius: f64,
    },
    /// A closed region.
    Polygon(Vec<LatLng>),
    /// An open path.
    Polyline(Vec<LatLng>),
    /// A dragged rectangle.
    Rectangle {
        /// South-west corner.
        south_west: LatLng,
        /// North-east corner.
        north_east: LatLng,
    },
}

/// The map SDK's drawing-mode manager, as the coordinator sees it.
pub trait DrawingSurface: Send + Sync {
    /// Arms or disarms the SDK draw mode.
    fn set_mode(&mut self, mode: Option<DrawMode>);

    /// Removes an overlay from the map surface.
    fn remove_overlay(&mut self, overlay: OverlayId);
}

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawState {
    /// Not drawing.
    Idle,
    /// Draw mode armed.
    Drawing(DrawMode),
}

/// Owns the drawing state machine and the single uncommitted overlay.
pub struct DrawingCoordinator {
    surface: Option<Box<dyn DrawingSurface>>,
    state: DrawState,
    current_overlay: Option<OverlayId>,
}

impl DrawingCoordinator {
    /// Creates a coordinator over a loaded drawing surface.
    #[must_use]
    pub fn new(surface: Box<dyn DrawingSurface>) -> Self {
        Self {
            surface: Some(surface),
            state: DrawState::Idle,
            current_overlay: None,
        }
    }

    /// Creates a coordinator for the degraded mode where the drawing
    /// library never loaded.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            surface: None,
            state: DrawState::Idle,
            current_overlay: None,
        }
    }

    /// Whether drawing is available at all.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.surface.is_some()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> DrawState {
        self.state
    }

    /// The uncommitted overlay, if one exists.
    #[must_use]
    pub const fn current_overlay(&self) -> Option<OverlayId> {
        self.current_overlay
    }

    /// Arms draw mode. Silently unavailable without a surface.
    pub fn arm(&mut self, mode: DrawMode) {
        let Some(surface) = self.surface.as_mut() else {
            log::debug!("drawing unavailable; arm({mode}) ignored");
            return;
        };
        surface.set_mode(Some(mode));
        self.state = DrawState::Drawing(mode);
    }

    /// Disarms draw mode.
    pub fn disarm(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.set_mode(None);
        }
        self.state = DrawState::Idle;
    }

    /// Handles a completed shape from the drawing manager.
    ///
    /// Replaces any previously uncommitted overlay with `overlay`, writes
    /// the shape's location encoding into `draft`, and — for every
    /// non-marker mode — disarms drawing after the single completion.
    /// Marker mode stays armed so several candidate points can be tried.
    pub fn complete(&mut self, overlay: OverlayId, shape: &DrawnShape, draft: &mut ReportDraft) {
        // At most one uncommitted shape may exist.
        if let Some(previous) = self.current_overlay.take()
            && let Some(surface) = self.surface.as_mut()
        {
            surface.remove_overlay(previous);
        }
        self.current_overlay = Some(overlay);

        match shape {
            DrawnShape::Point(point) => {
                draft.lat = Some(point.lat);
                draft.lng = Some(point.lng);
                draft.location_text = Some(format_pair(*point));
            }
            DrawnShape::Circle { center, .. } => {
                // Readable placeholder: the center twice. The radius is
                // not representable in the pair encoding.
                draft.location_text = Some(format_pairs(&[*center, *center]));
            }
            DrawnShape::Polygon(path) | DrawnShape::Polyline(path) => {
                draft.location_text = Some(format_pairs(path));
            }
            DrawnShape::Rectangle {
                south_west,
                north_east,
            } => {
                draft.location_text = Some(format_pairs(&[*south_west, *north_east]));
            }
        }

        if !matches!(shape, DrawnShape::Point(_)) {
            self.disarm();
        }
    }

    /// Drops the uncommitted overlay (report drawer closed without
    /// saving).
    pub fn clear(&mut self) {
        if let Some(overlay) = self.current_overlay.take()
            && let Some(surface) = self.surface.as_mut()
        {
            surface.remove_overlay(overlay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordedSurface {
        mode_calls: Vec<Option<DrawMode>>,
        removed: Vec<OverlayId>,
    }

    #[derive(Clone, Default)]
    struct SharedSurface(Arc<Mutex<RecordedSurface>>);

    impl DrawingSurface for SharedSurface {
        fn set_mode(&mut self, mode: Option<DrawMode>) {
            self.0.lock().unwrap().mode_calls.push(mode);
        }

        fn remove_overlay(&mut self, overlay: OverlayId) {
            self.0.lock().unwrap().removed.push(overlay);
        }
    }

    fn coordinator() -> (DrawingCoordinator, SharedSurface) {
        let surface = SharedSurface::default();
        (DrawingCoordinator::new(Box::new(surface.clone())), surface)
    }

    #[test]
    fn completing_a_point_fills_the_draft_and_stays_armed() {
        let (mut coordinator, surface) = coordinator();
        let mut draft = ReportDraft::default();

        coordinator.arm(DrawMode::Marker);
        coordinator.complete(1, &DrawnShape::Point(LatLng::new(11.5, 104.9)), &mut draft);

        assert_eq!(draft.lat, Some(11.5));
        assert_eq!(draft.lng, Some(104.9));
        assert_eq!(draft.location_text.as_deref(), Some("11.500000,104.900000"));
        assert_eq!(coordinator.state(), DrawState::Drawing(DrawMode::Marker));
        assert!(surface.0.lock().unwrap().removed.is_empty());
    }

    #[test]
    fn completing_a_shape_disarms_after_one() {
        let (mut coordinator, surface) = coordinator();
        let mut draft = ReportDraft::default();

        coordinator.arm(DrawMode::Rectangle);
        coordinator.complete(
            7,
            &DrawnShape::Rectangle {
                south_west: LatLng::new(11.0, 104.0),
                north_east: LatLng::new(12.0, 105.0),
            },
            &mut draft,
        );

        assert_eq!(
            draft.location_text.as_deref(),
            Some("11.000000,104.000000; 12.000000,105.000000")
        );
        assert_eq!(coordinator.state(), DrawState::Idle);
        // Disarm reached the SDK.
        assert_eq!(
            surface.0.lock().unwrap().mode_calls.last().copied(),
            Some(None)
        );
    }

    #[test]
    fn at_most_one_uncommitted_overlay() {
        let (mut coordinator, surface) = coordinator();
        let mut draft = ReportDraft::default();

        coordinator.arm(DrawMode::Marker);
        coordinator.complete(1, &DrawnShape::Point(LatLng::new(1.0, 2.0)), &mut draft);
        coordinator.complete(2, &DrawnShape::Point(LatLng::new(3.0, 4.0)), &mut draft);

        assert_eq!(surface.0.lock().unwrap().removed, vec![1]);
        assert_eq!(coordinator.current_overlay(), Some(2));

        coordinator.clear();
        assert_eq!(surface.0.lock().unwrap().removed, vec![1, 2]);
        assert_eq!(coordinator.current_overlay(), None);
    }

    #[test]
    fn circle_serializes_its_center_twice() {
        let (mut coordinator, _surface) = coordinator();
        let mut draft = ReportDraft::default();

        coordinator.arm(DrawMode::Circle);
        coordinator.complete(
            3,
            &DrawnShape::Circle {
                center: LatLng::new(11.5, 104.9),
                radius: 250.0,
            },
            &mut draft,
        );

        assert_eq!(
            draft.location_text.as_deref(),
            Some("11.500000,104.900000; 11.500000,104.900000")
        );
    }

    #[test]
    fn unavailable_surface_makes_arming_a_silent_noop() {
        let mut coordinator = DrawingCoordinator::unavailable();
        assert!(!coordinator.is_available());

        coordinator.arm(DrawMode::Polygon);
        assert_eq!(coordinator.state(), DrawState::Idle);

        // Completion still records the draft text (manual entry path is
        // unaffected either way).
        let mut draft = ReportDraft::default();
        coordinator.complete(9, &DrawnShape::Point(LatLng::new(1.0, 1.0)), &mut draft);
        assert!(draft.location_text.is_some());
    }
}
