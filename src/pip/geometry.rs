//! Planar containment and distance primitives.
//!
//! Coordinates are treated as planar with x = longitude and y = latitude for
//! containment. Distances find the nearest boundary point in a local
//! equirectangular projection centred on the query point and measure the
//! great-circle distance to it. Rings crossing the antimeridian are not
//! supported.

use crate::models::{Point, Polygon};

/// Mean earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Even-odd ray casting test.
///
/// Casts a ray from the point towards +x and toggles on every edge crossing.
/// Horizontal edges are skipped outright: they cannot cross a horizontal ray
/// except along the ray itself, which never toggles containment. Results for
/// points exactly on an edge are deterministic but unspecified.
pub fn contains(polygon: &Polygon, point: &Point) -> bool {
    let ring = polygon.ring();
    if ring.len() < 3 {
        return false;
    }

    let (px, py) = (point.longitude, point.latitude);
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].longitude, ring[i].latitude);
        let (xj, yj) = (ring[j].longitude, ring[j].latitude);
        j = i;

        if yi == yj {
            continue;
        }

        if (yi > py) != (yj > py) {
            let x_cross = xi + (py - yi) * (xj - xi) / (yj - yi);
            if px < x_cross {
                inside = !inside;
            }
        }
    }

    inside
}

/// Minimum distance in meters from the point to the polygon's ring.
///
/// Measures to the boundary only, so a point deep inside a polygon is still
/// some distance away from it. Callers that care check [`contains`] first.
///
/// The nearest boundary point is found in the local projection; the
/// returned distance is the great-circle distance to it.
pub fn distance_to_polygon_meters(point: &Point, polygon: &Polygon) -> f64 {
    let ring = polygon.ring();
    if ring.is_empty() {
        return f64::INFINITY;
    }

    let projection = LocalProjection::new(point);
    let projected: Vec<(f64, f64)> = ring.iter().map(|v| projection.project(v)).collect();

    let mut best = (f64::INFINITY, (0.0, 0.0));
    let mut j = projected.len() - 1;
    for i in 0..projected.len() {
        let closest = closest_on_segment(projected[j], projected[i]);
        let d = closest.0.hypot(closest.1);
        if d < best.0 {
            best = (d, closest);
        }
        j = i;
    }

    haversine_meters(point, &projection.unproject(best.1))
}

/// Great-circle distance in meters between two points
pub fn haversine_meters(a: &Point, b: &Point) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Degree extents (latitude, longitude) covering `meters` around a latitude.
///
/// Used to widen bounding boxes for radius queries. Slightly generous near
/// the poles where the longitude extent grows without bound.
pub fn degree_extent(latitude: f64, meters: f64) -> (f64, f64) {
    let dlat = (meters / EARTH_RADIUS_M).to_degrees();
    let cos_lat = latitude.to_radians().cos().abs().max(1e-6);
    let dlon = (meters / (EARTH_RADIUS_M * cos_lat)).to_degrees();
    (dlat, dlon.min(360.0))
}

/// Equirectangular projection to meters around an origin
struct LocalProjection {
    origin: Point,
    cos_lat: f64,
}

impl LocalProjection {
    fn new(origin: &Point) -> Self {
        Self {
            origin: *origin,
            cos_lat: origin.latitude.to_radians().cos(),
        }
    }

    fn project(&self, p: &Point) -> (f64, f64) {
        let x = (p.longitude - self.origin.longitude).to_radians() * self.cos_lat * EARTH_RADIUS_M;
        let y = (p.latitude - self.origin.latitude).to_radians() * EARTH_RADIUS_M;
        (x, y)
    }

    fn unproject(&self, (x, y): (f64, f64)) -> Point {
        Point {
            latitude: self.origin.latitude + (y / EARTH_RADIUS_M).to_degrees(),
            longitude: self.origin.longitude
                + (x / (self.cos_lat.max(1e-12) * EARTH_RADIUS_M)).to_degrees(),
        }
    }
}

/// Point of segment a-b nearest the projection origin, clamped to the endpoints
fn closest_on_segment(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return a;
    }

    let t = (-(a.0 * dx + a.1 * dy) / len_sq).clamp(0.0, 1.0);
    (a.0 + t * dx, a.1 + t * dy)
}
