use std::f64::consts::PI;

use super::location::{BoundingBox, GeoPoint, LatLng};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Flat-earth scale used for every local offset in the crate.
pub const METERS_PER_DEGREE_LAT: f64 = 111_111.0;

pub fn meters_per_degree_lng(lat_degrees: f64) -> f64 {
    METERS_PER_DEGREE_LAT * lat_degrees.to_radians().cos()
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Moves `origin` by `east_m` / `north_m` metres on the local tangent plane.
pub fn offset_by_meters(origin: LatLng, east_m: f64, north_m: f64) -> LatLng {
    LatLng::new(
        origin.lat + north_m / METERS_PER_DEGREE_LAT,
        origin.lng + east_m / meters_per_degree_lng(origin.lat),
    )
}

/// Inverse of [`offset_by_meters`]: (east, north) metres from `origin` to `point`.
pub fn meters_between(origin: LatLng, point: LatLng) -> (f64, f64) {
    (
        (point.lng - origin.lng) * meters_per_degree_lng(origin.lat),
        (point.lat - origin.lat) * METERS_PER_DEGREE_LAT,
    )
}

/// Closed ring of `segments + 1` vertices around `center`.
pub fn circle_ring(center: LatLng, radius_m: f64, segments: usize, altitude: f64) -> Vec<GeoPoint> {
    let segments = segments.max(3);
    (0..=segments)
        .map(|step| {
            let angle = step as f64 / segments as f64 * 2.0 * PI;
            offset_by_meters(center, radius_m * angle.sin(), radius_m * angle.cos())
                .at_altitude(altitude)
        })
        .collect()
}

/// Approximate area of a viewport rectangle in square metres.
pub fn viewport_area_m2(viewport: &BoundingBox) -> f64 {
    let ne = viewport.ne;
    let sw = viewport.sw;
    let north_south_km = haversine_km(ne, LatLng::new(sw.lat, ne.lng));
    let east_west_km = haversine_km(ne, LatLng::new(ne.lat, sw.lng));
    north_south_km * east_west_km * 1_000_000.0
}
