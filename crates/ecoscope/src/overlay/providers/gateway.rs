//! Boundary to the external lookups. Response types mirror the upstream JSON
//! and never leave the provider that consumes them.

use std::collections::BTreeMap;
use std::fmt::Debug;

use futures::future::BoxFuture;
use serde::Deserialize;

use crate::geo::{BoundingBox, LatLng};
use crate::overlay::roof::{RoofSegment, RoofSegmentStats};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unable to decode upstream response: {0}")]
    Decode(String),
    #[error("upstream rejected the request: {0}")]
    Rejected(String),
    #[error("no API key configured for {0}")]
    MissingApiKey(&'static str),
}

pub trait AirQualityGateway: Debug + Send + Sync {
    fn current_conditions(&self, at: LatLng)
        -> BoxFuture<'_, Result<AirQualityResponse, GatewayError>>;
}

pub trait SolarGateway: Debug + Send + Sync {
    fn building_insights(&self, at: LatLng)
        -> BoxFuture<'_, Result<BuildingInsightsResponse, GatewayError>>;
}

pub trait PlacesGateway: Debug + Send + Sync {
    fn nearby_search(&self, request: NearbySearch) -> BoxFuture<'_, Result<Vec<Place>, GatewayError>>;
    fn geocode(&self, place_id: String) -> BoxFuture<'_, Result<LatLng, GatewayError>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbySearch {
    pub location: LatLng,
    pub radius_meters: f64,
    pub types: Vec<&'static str>,
}

/// One nearby-search hit, already flattened out of the Places envelope.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Place {
    pub place_id: String,
    pub name: String,
    pub location: LatLng,
    pub viewport: Option<BoundingBox>,
    pub types: Vec<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityResponse {
    #[serde(default)]
    pub indexes: Vec<AqiIndex>,
    pub dominant_pollutant: Option<String>,
    #[serde(default)]
    pub health_recommendations: BTreeMap<String, String>,
    pub date_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AqiIndex {
    pub aqi: Option<f64>,
    pub aqi_display: Option<String>,
    pub category: Option<String>,
    pub display_name: Option<String>,
    pub dominant_pollutant: Option<String>,
    pub color: Option<WireColor>,
}

/// Channel intensities in `0.0..=1.0`; absent channels are zero.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WireColor {
    #[serde(default)]
    pub red: f64,
    #[serde(default)]
    pub green: f64,
    #[serde(default)]
    pub blue: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingInsightsResponse {
    pub bounding_box: Option<WireBox>,
    pub solar_potential: Option<SolarPotential>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarPotential {
    pub max_sunshine_hours_per_year: Option<f64>,
    pub max_array_area_meters2: Option<f64>,
    pub carbon_offset_factor_kg_per_mwh: Option<f64>,
    #[serde(default)]
    pub roof_segment_stats: Vec<WireRoofSegment>,
    #[serde(default)]
    pub solar_panel_configs: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WireLatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

impl From<WireLatLng> for LatLng {
    fn from(value: WireLatLng) -> Self {
        LatLng::new(value.latitude, value.longitude)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WireBox {
    #[serde(default)]
    pub sw: WireLatLng,
    #[serde(default)]
    pub ne: WireLatLng,
}

impl From<WireBox> for BoundingBox {
    fn from(value: WireBox) -> Self {
        BoundingBox {
            sw: value.sw.into(),
            ne: value.ne.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRoofSegment {
    pub pitch_degrees: Option<f64>,
    pub azimuth_degrees: Option<f64>,
    pub plane_height_at_center_meters: Option<f64>,
    #[serde(default)]
    pub center: WireLatLng,
    #[serde(default)]
    pub bounding_box: WireBox,
    #[serde(default)]
    pub stats: WireRoofStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRoofStats {
    #[serde(default)]
    pub area_meters2: f64,
    #[serde(default)]
    pub sunshine_quantiles: Vec<f64>,
}

impl From<WireRoofSegment> for RoofSegment {
    fn from(value: WireRoofSegment) -> Self {
        RoofSegment {
            pitch_degrees: value.pitch_degrees.unwrap_or(0.0),
            azimuth_degrees: value.azimuth_degrees.unwrap_or(0.0),
            plane_height_at_center_meters: value.plane_height_at_center_meters.unwrap_or(0.0),
            center: value.center.into(),
            bounding_box: value.bounding_box.into(),
            stats: RoofSegmentStats {
                area_meters2: value.stats.area_meters2,
                sunshine_quantiles: value.stats.sunshine_quantiles,
            },
        }
    }
}
