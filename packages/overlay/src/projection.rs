//! Web-Mercator world-pixel projection.

use civic_portal_geo_models::LatLng;

/// Tile edge length in pixels.
const TILE_SIZE: f64 = 256.0;

/// Mercator latitude clamp; beyond this the projection diverges.
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Projects a geographic position to world-pixel coordinates at a zoom
/// level (a `256 * 2^zoom` square world).
///
/// Latitudes are clamped to the Mercator limit, so poles map onto the
/// world edge instead of infinity.
#[must_use]
pub fn project(position: LatLng, zoom: u8) -> (f64, f64) {
    let world = TILE_SIZE * f64::from(1_u32 << u32::from(zoom.min(24)));
    let lat = position.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = (position.lng + 180.0) / 360.0 * world;
    let y = (1.0 - ((lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI)) / 2.0 * world;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_projects_to_world_center() {
        let (x, y) = project(LatLng::new(0.0, 0.0), 0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_doubles_world_coordinates() {
        let p = LatLng::new(11.5564, 104.9282);
        let (x1, y1) = project(p, 10);
        let (x2, y2) = project(p, 11);
        assert!((x2 - 2.0 * x1).abs() < 1e-6);
        assert!((y2 - 2.0 * y1).abs() < 1e-6);
    }

    #[test]
    fn east_is_right_and_north_is_up() {
        let (x_west, _) = project(LatLng::new(0.0, -90.0), 3);
        let (x_east, _) = project(LatLng::new(0.0, 90.0), 3);
        assert!(x_east > x_west);

        let (_, y_north) = project(LatLng::new(45.0, 0.0), 3);
        let (_, y_south) = project(LatLng::new(-45.0, 0.0), 3);
        assert!(y_north < y_south);
    }

    #[test]
    fn poles_stay_on_the_world_edge() {
        let (_, y) = project(LatLng::new(90.0, 0.0), 0);
        assert!(y.abs() < 1e-6);
        let (_, y) = project(LatLng::new(-90.0, 0.0), 0);
        assert!((y - 256.0).abs() < 1e-6);
    }
}
