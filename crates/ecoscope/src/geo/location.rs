use serde::{Deserialize, Serialize};

/// How the viewed location was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationOrigin {
    Search,
    Map,
    #[default]
    Initial,
}

impl LocationOrigin {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Map => "map",
            Self::Initial => "initial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub const fn at_altitude(self, altitude: f64) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
            altitude,
        }
    }
}

/// A vertex handed to the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
}

impl GeoPoint {
    pub const fn lat_lng(self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// South-west / north-east corner pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub sw: LatLng,
    pub ne: LatLng,
}

impl BoundingBox {
    pub fn lat_span(&self) -> f64 {
        self.ne.lat - self.sw.lat
    }

    pub fn lng_span(&self) -> f64 {
        self.ne.lng - self.sw.lng
    }

    /// Closed ground-level ring sw → se → ne → nw → sw.
    pub fn ring(&self, altitude: f64) -> Vec<GeoPoint> {
        vec![
            GeoPoint { lat: self.sw.lat, lng: self.sw.lng, altitude },
            GeoPoint { lat: self.sw.lat, lng: self.ne.lng, altitude },
            GeoPoint { lat: self.ne.lat, lng: self.ne.lng, altitude },
            GeoPoint { lat: self.ne.lat, lng: self.sw.lng, altitude },
            GeoPoint { lat: self.sw.lat, lng: self.sw.lng, altitude },
        ]
    }
}

/// The point every provider call is made against. Replaced wholesale, never
/// mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
    pub origin: LocationOrigin,
}

impl Location {
    pub const DEFAULT_ALTITUDE: f64 = 400.0;

    pub const fn new(lat: f64, lng: f64, altitude: f64, origin: LocationOrigin) -> Self {
        Self {
            lat,
            lng,
            altitude,
            origin,
        }
    }

    pub const fn from_search(position: LatLng) -> Self {
        Self::new(
            position.lat,
            position.lng,
            Self::DEFAULT_ALTITUDE,
            LocationOrigin::Search,
        )
    }

    pub const fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(
            43.433_047_1,
            -80.447_597_4,
            Self::DEFAULT_ALTITUDE,
            LocationOrigin::Initial,
        )
    }
}
