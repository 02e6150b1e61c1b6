//! Normalized per-layer metric records. Each provider call produces exactly one
//! and the store only ever replaces them wholesale.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::geo::{BoundingBox, LatLng};
use crate::overlay::layers::LayerId;
use crate::overlay::roof::RoofSegment;
use crate::render::Color;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layer", content = "metrics", rename_all = "camelCase")]
pub enum MetricPayload {
    AirQuality(AirQualityMetrics),
    Solar(SolarMetrics),
    Walkability(WalkabilityMetrics),
    GreenSpaces(GreenSpaceMetrics),
    Transit(TransitMetrics),
}

impl MetricPayload {
    pub const fn layer(&self) -> LayerId {
        match self {
            Self::AirQuality(_) => LayerId::AirQuality,
            Self::Solar(_) => LayerId::Solar,
            Self::Walkability(_) => LayerId::Walkability,
            Self::GreenSpaces(_) => LayerId::GreenSpaces,
            Self::Transit(_) => LayerId::Transit,
        }
    }
}

/// Latest payload per layer. Keys always agree with `MetricPayload::layer`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PayloadStore {
    entries: BTreeMap<LayerId, MetricPayload>,
}

impl PayloadStore {
    pub fn replace(&mut self, payload: MetricPayload) -> Option<MetricPayload> {
        self.entries.insert(payload.layer(), payload)
    }

    pub fn clear(&mut self, layer: LayerId) -> Option<MetricPayload> {
        self.entries.remove(&layer)
    }

    pub fn get(&self, layer: LayerId) -> Option<&MetricPayload> {
        self.entries.get(&layer)
    }

    pub fn has(&self, layer: LayerId) -> bool {
        self.entries.contains_key(&layer)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn air_quality(&self) -> Option<&AirQualityMetrics> {
        match self.entries.get(&LayerId::AirQuality) {
            Some(MetricPayload::AirQuality(metrics)) => Some(metrics),
            _ => None,
        }
    }

    pub fn solar(&self) -> Option<&SolarMetrics> {
        match self.entries.get(&LayerId::Solar) {
            Some(MetricPayload::Solar(metrics)) => Some(metrics),
            _ => None,
        }
    }

    pub fn walkability(&self) -> Option<&WalkabilityMetrics> {
        match self.entries.get(&LayerId::Walkability) {
            Some(MetricPayload::Walkability(metrics)) => Some(metrics),
            _ => None,
        }
    }

    pub fn green_spaces(&self) -> Option<&GreenSpaceMetrics> {
        match self.entries.get(&LayerId::GreenSpaces) {
            Some(MetricPayload::GreenSpaces(metrics)) => Some(metrics),
            _ => None,
        }
    }

    pub fn transit(&self) -> Option<&TransitMetrics> {
        match self.entries.get(&LayerId::Transit) {
            Some(MetricPayload::Transit(metrics)) => Some(metrics),
            _ => None,
        }
    }
}

impl FromIterator<MetricPayload> for PayloadStore {
    fn from_iter<T: IntoIterator<Item = MetricPayload>>(iter: T) -> Self {
        let mut store = Self::default();
        for payload in iter {
            store.replace(payload);
        }
        store
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityMetrics {
    pub aqi: Option<f64>,
    pub category: Option<String>,
    pub display_name: Option<String>,
    pub color: Option<Color>,
    pub dominant_pollutant: Option<String>,
    pub health_recommendations: BTreeMap<String, String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarMetrics {
    pub building_box: Option<BoundingBox>,
    pub segments: Vec<RoofSegment>,
    pub max_sunshine_hours_per_year: Option<f64>,
    pub max_array_area_meters2: Option<f64>,
    pub carbon_offset_factor_kg_per_mwh: Option<f64>,
    pub panel_config_count: usize,
}

impl SolarMetrics {
    pub fn total_area(&self) -> f64 {
        self.segments.iter().map(|s| s.stats.area_meters2).sum()
    }

    /// Sum of each segment's mean sunshine weighted by its area.
    pub fn total_solar_potential(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| s.stats.mean_sunshine().unwrap_or(0.0) * s.stats.area_meters2)
            .sum()
    }

    pub fn area_weighted_sunshine(&self) -> Option<f64> {
        let area = self.total_area();
        if area > 0.0 {
            Some(self.total_solar_potential() / area)
        } else {
            None
        }
    }

    pub fn largest_segment(&self) -> Option<&RoofSegment> {
        self.segments
            .iter()
            .max_by(|a, b| a.stats.area_meters2.total_cmp(&b.stats.area_meters2))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Amenity {
    pub name: String,
    pub kind: String,
    pub distance_km: f64,
    pub location: LatLng,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkabilityMetrics {
    pub amenities: BTreeMap<String, Vec<Amenity>>,
}

impl WalkabilityMetrics {
    pub fn total_amenities(&self) -> usize {
        self.amenities.values().map(Vec::len).sum()
    }

    pub fn distinct_types(&self) -> usize {
        self.amenities.values().filter(|places| !places.is_empty()).count()
    }

    pub fn average_distance_km(&self) -> Option<f64> {
        let count = self.total_amenities();
        if count == 0 {
            return None;
        }
        let total: f64 = self
            .amenities
            .values()
            .flatten()
            .map(|amenity| amenity.distance_km)
            .sum();
        Some(total / count as f64)
    }

    /// Coarse 0-100 index: twenty amenities within walking distance is a full score.
    pub fn quick_index(&self) -> u8 {
        let raw = (self.total_amenities() as f64 / 20.0 * 100.0).round();
        raw.clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GreenSpace {
    pub place_id: String,
    pub name: String,
    pub location: LatLng,
    pub area_meters2: f64,
    pub distance_km: f64,
    pub types: Vec<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
}

const GENERIC_PLACE_TYPES: [&str; 2] = ["point_of_interest", "establishment"];

/// Parks larger than this earn the quality bonus.
pub const LARGE_PARK_METERS2: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GreenSpaceMetrics {
    pub spaces: Vec<GreenSpace>,
}

impl GreenSpaceMetrics {
    pub fn count(&self) -> usize {
        self.spaces.len()
    }

    pub fn total_area(&self) -> f64 {
        self.spaces.iter().map(|space| space.area_meters2).sum()
    }

    pub fn average_distance_km(&self) -> Option<f64> {
        mean(self.spaces.iter().map(|space| space.distance_km))
    }

    /// Unrated spaces count as zero.
    pub fn average_rating(&self) -> Option<f64> {
        mean(self.spaces.iter().map(|space| space.rating.unwrap_or(0.0)))
    }

    pub fn has_large_park(&self) -> bool {
        self.spaces
            .iter()
            .any(|space| space.area_meters2 > LARGE_PARK_METERS2)
    }

    pub fn park_types(&self) -> BTreeMap<&str, usize> {
        let mut types = BTreeMap::new();
        for kind in self.spaces.iter().flat_map(|space| &space.types) {
            if !GENERIC_PLACE_TYPES.contains(&kind.as_str()) {
                *types.entry(kind.as_str()).or_insert(0) += 1;
            }
        }
        types
    }

    pub fn total_reviews(&self) -> u64 {
        self.spaces
            .iter()
            .map(|space| u64::from(space.user_ratings_total.unwrap_or(0)))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StationKind {
    Subway,
    Train,
    Bus,
    Transit,
}

impl StationKind {
    pub const PLACE_TYPES: [&'static str; 4] = [
        "transit_station",
        "subway_station",
        "train_station",
        "bus_station",
    ];

    pub fn from_place_type(kind: &str) -> Option<Self> {
        match kind {
            "subway_station" => Some(Self::Subway),
            "train_station" => Some(Self::Train),
            "bus_station" => Some(Self::Bus),
            "transit_station" => Some(Self::Transit),
            _ => None,
        }
    }

    /// First recognised transit type in the place's own type order.
    pub fn classify<'a>(types: impl IntoIterator<Item = &'a str>) -> Self {
        types
            .into_iter()
            .find_map(Self::from_place_type)
            .unwrap_or(Self::Transit)
    }

    pub const fn place_type(self) -> &'static str {
        match self {
            Self::Subway => "subway_station",
            Self::Train => "train_station",
            Self::Bus => "bus_station",
            Self::Transit => "transit_station",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Subway => "Subway",
            Self::Train => "Train",
            Self::Bus => "Bus",
            Self::Transit => "Transit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitStation {
    pub place_id: String,
    pub name: String,
    pub location: LatLng,
    pub distance_km: f64,
    pub kind: StationKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitMetrics {
    pub stations: Vec<TransitStation>,
}

impl TransitMetrics {
    pub fn count(&self) -> usize {
        self.stations.len()
    }

    pub fn distribution(&self) -> BTreeMap<StationKind, usize> {
        let mut counts = BTreeMap::new();
        for station in &self.stations {
            *counts.entry(station.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn distinct_types(&self) -> usize {
        self.stations
            .iter()
            .map(|station| station.kind)
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn average_distance_km(&self) -> Option<f64> {
        mean(self.stations.iter().map(|station| station.distance_km))
    }

    pub fn closest(&self) -> Option<&TransitStation> {
        self.stations
            .iter()
            .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
