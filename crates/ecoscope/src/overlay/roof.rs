//! Projection of roof-segment statistics onto a tilted 3D quadrilateral.

use serde::{Deserialize, Serialize};

use crate::geo::math::{meters_per_degree_lng, METERS_PER_DEGREE_LAT};
use crate::geo::{BoundingBox, GeoPoint, LatLng};
use crate::render::Color;

/// Smallest pitch the projector will draw; a zero slope collapses the plane.
pub const MIN_PITCH_DEGREES: f64 = 0.2436;

/// Keeps each segment inside its parent building outline.
const FOOTPRINT_SHRINK: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoofSegmentStats {
    pub area_meters2: f64,
    pub sunshine_quantiles: Vec<f64>,
}

impl RoofSegmentStats {
    /// Mean of the sunshine quantiles, `None` for an empty list.
    pub fn mean_sunshine(&self) -> Option<f64> {
        if self.sunshine_quantiles.is_empty() {
            return None;
        }
        let total: f64 = self.sunshine_quantiles.iter().sum();
        Some(total / self.sunshine_quantiles.len() as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoofSegment {
    pub pitch_degrees: f64,
    pub azimuth_degrees: f64,
    pub plane_height_at_center_meters: f64,
    pub center: LatLng,
    pub bounding_box: BoundingBox,
    pub stats: RoofSegmentStats,
}

/// Closed five-vertex ring describing the segment's roof plane.
pub fn project_roof_segment(segment: &RoofSegment) -> Vec<GeoPoint> {
    let pitch = segment.pitch_degrees.max(MIN_PITCH_DEGREES).to_radians();
    let azimuth = (segment.azimuth_degrees + 180.0)
        .rem_euclid(360.0)
        .to_radians();

    let lng_scale = meters_per_degree_lng(segment.center.lat);
    let width = (segment.bounding_box.lng_span() * lng_scale).abs();
    let length = (segment.bounding_box.lat_span() * METERS_PER_DEGREE_LAT).abs();

    let half_w = width * FOOTPRINT_SHRINK / 2.0;
    let half_l = length * FOOTPRINT_SHRINK / 2.0;
    let corners = [
        (-half_w, -half_l),
        (half_w, -half_l),
        (half_w, half_l),
        (-half_w, half_l),
    ];

    let (sin_az, cos_az) = azimuth.sin_cos();
    let mut ring: Vec<GeoPoint> = corners
        .iter()
        .map(|&(dx, dy)| {
            let east = dx * cos_az - dy * sin_az;
            let north = dx * sin_az + dy * cos_az;
            let height_offset = pitch.sin() * north;

            GeoPoint {
                lat: segment.center.lat + north / METERS_PER_DEGREE_LAT,
                lng: segment.center.lng + east / lng_scale,
                altitude: segment.plane_height_at_center_meters + height_offset,
            }
        })
        .collect();

    ring.push(ring[0]);
    ring
}

/// Solar efficiency bucket from annual sunshine (kWh/m²/year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolarEfficiency {
    Excellent,
    Good,
    Fair,
    Poor,
    Unknown,
}

impl SolarEfficiency {
    pub fn from_quantiles(quantiles: &[f64]) -> Self {
        if quantiles.is_empty() {
            return Self::Unknown;
        }
        let mean = quantiles.iter().sum::<f64>() / quantiles.len() as f64;
        Self::from_sunshine(mean)
    }

    pub fn from_sunshine(mean: f64) -> Self {
        if mean >= 1200.0 {
            Self::Excellent
        } else if mean >= 1000.0 {
            Self::Good
        } else if mean >= 800.0 {
            Self::Fair
        } else if mean > 0.0 {
            Self::Poor
        } else {
            Self::Unknown
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Unknown => "unknown",
        }
    }

    pub const fn fill_color(self) -> Color {
        match self {
            Self::Excellent => Color::rgba(0, 150, 0, 0.7),
            Self::Good => Color::rgba(150, 150, 0, 0.7),
            Self::Fair => Color::rgba(150, 100, 0, 0.7),
            Self::Poor => Color::rgba(150, 0, 0, 0.7),
            Self::Unknown => Color::rgba(128, 128, 128, 0.5),
        }
    }
}
