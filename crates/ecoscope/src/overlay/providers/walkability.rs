use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;

use super::gateway::{NearbySearch, PlacesGateway};
use super::metrics::{Amenity, MetricPayload, WalkabilityMetrics};
use super::{LayerData, LayerProvider, ProviderError};
use crate::geo::math::circle_ring;
use crate::geo::{haversine_km, Location};
use crate::overlay::layers::LayerId;
use crate::render::{AltitudeMode, Color, MarkerPrimitive, PolygonPrimitive, Primitive};

/// Roughly a fifteen minute walk.
pub const WALKING_RADIUS_KM: f64 = 1.2;
const WALK_MINUTES: f64 = 15.0;
const RING_ALTITUDE: f64 = 50.0;

pub const WALKABLE_PLACE_TYPES: [&str; 11] = [
    "restaurant",
    "cafe",
    "grocery_or_supermarket",
    "park",
    "pharmacy",
    "school",
    "shopping_mall",
    "convenience_store",
    "bus_station",
    "subway_station",
    "train_station",
];

const WALK_GREEN: Color = Color::opaque(76, 175, 80);

fn marker_color(kind: &str) -> Color {
    match kind {
        "restaurant" => Color::opaque(0xFF, 0x52, 0x52),
        "cafe" => Color::opaque(0xFF, 0x98, 0x00),
        "grocery_or_supermarket" => Color::opaque(0x4C, 0xAF, 0x50),
        "park" => Color::opaque(0x66, 0xBB, 0x6A),
        "pharmacy" => Color::opaque(0xE9, 0x1E, 0x63),
        "school" => Color::opaque(0x21, 0x96, 0xF3),
        "shopping_mall" => Color::opaque(0x9C, 0x27, 0xB0),
        "convenience_store" => Color::opaque(0x00, 0xBC, 0xD4),
        "bus_station" => Color::opaque(0xFF, 0xC1, 0x07),
        "subway_station" => Color::opaque(0x3F, 0x51, 0xB5),
        "train_station" => Color::opaque(0x67, 0x3A, 0xB7),
        _ => Color::opaque(0x9E, 0x9E, 0x9E),
    }
}

#[derive(Debug, Clone)]
pub struct WalkabilityProvider {
    places: Arc<dyn PlacesGateway>,
}

impl WalkabilityProvider {
    pub fn new(places: Arc<dyn PlacesGateway>) -> Self {
        Self { places }
    }

    /// One search per amenity type; a failed type contributes nothing.
    async fn collect_amenities(&self, location: &Location) -> BTreeMap<String, Vec<Amenity>> {
        let searches: Vec<_> = WALKABLE_PLACE_TYPES
            .iter()
            .map(|&kind| {
                let request = NearbySearch {
                    location: location.position(),
                    radius_meters: WALKING_RADIUS_KM * 1000.0,
                    types: vec![kind],
                };
                async move { (kind, self.places.nearby_search(request).await) }
            })
            .collect();

        let mut amenities = BTreeMap::new();
        for (kind, outcome) in join_all(searches).await {
            match outcome {
                Ok(places) => {
                    let nearby: Vec<Amenity> = places
                        .into_iter()
                        .map(|place| Amenity {
                            distance_km: haversine_km(location.position(), place.location),
                            name: place.name,
                            kind: kind.to_string(),
                            location: place.location,
                        })
                        .filter(|amenity| amenity.distance_km <= WALKING_RADIUS_KM)
                        .collect();
                    amenities.insert(kind.to_string(), nearby);
                }
                Err(err) => {
                    tracing::warn!(kind, error = %err, "amenity search failed; skipping type");
                }
            }
        }
        amenities
    }
}

impl LayerProvider for WalkabilityProvider {
    fn layer(&self) -> LayerId {
        LayerId::Walkability
    }

    fn load(&self, location: Location) -> BoxFuture<'_, Result<LayerData, ProviderError>> {
        async move {
            let amenities = self.collect_amenities(&location).await;
            let metrics = WalkabilityMetrics { amenities };
            let total = metrics.total_amenities();
            tracing::debug!(total, types = metrics.distinct_types(), "walkability amenities collected");

            let mut primitives = walk_radius(&location);
            primitives.extend(metrics.amenities.values().flatten().map(amenity_marker));

            let notice = Some(format!(
                "Walkability Score: {}/100 ({} amenities within 15-min walk)",
                metrics.quick_index(),
                total
            ));

            Ok(LayerData {
                primitives,
                payload: MetricPayload::Walkability(metrics),
                notice,
            })
        }
        .boxed()
    }
}

fn walk_radius(location: &Location) -> Vec<Primitive> {
    let ring = circle_ring(
        location.position(),
        WALKING_RADIUS_KM * 1000.0,
        64,
        RING_ALTITUDE,
    );

    vec![
        Primitive::Polygon(PolygonPrimitive {
            outer_coordinates: ring.clone(),
            stroke_color: WALK_GREEN.with_alpha(0.9),
            stroke_width: 5.0,
            fill_color: WALK_GREEN.with_alpha(0.08),
            altitude_mode: AltitudeMode::RelativeToGround,
            extruded: true,
            draws_occluded_segments: true,
            label: Some("15-minute walk".to_string()),
        }),
        Primitive::Polygon(PolygonPrimitive {
            outer_coordinates: ring,
            stroke_color: WALK_GREEN.with_alpha(0.4),
            stroke_width: 1.0,
            fill_color: WALK_GREEN.with_alpha(0.1),
            altitude_mode: AltitudeMode::RelativeToGround,
            extruded: false,
            draws_occluded_segments: true,
            label: None,
        }),
    ]
}

fn amenity_marker(amenity: &Amenity) -> Primitive {
    let minutes = (amenity.distance_km / WALKING_RADIUS_KM * WALK_MINUTES).round();
    Primitive::Marker(MarkerPrimitive {
        position: amenity.location.at_altitude(0.0),
        altitude_mode: AltitudeMode::RelativeToGround,
        icon_color: marker_color(&amenity.kind),
        label: format!(
            "{} - {} ({:.2}km, ~{} min walk)",
            amenity.name,
            amenity.kind.replace('_', " "),
            amenity.distance_km,
            minutes
        ),
    })
}
