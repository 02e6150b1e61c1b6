//! Coordinates and the small amount of spherical math the overlays need.

mod location;
pub mod math;

pub use location::{BoundingBox, GeoPoint, LatLng, Location, LocationOrigin};
pub use math::{haversine_km, METERS_PER_DEGREE_LAT};
