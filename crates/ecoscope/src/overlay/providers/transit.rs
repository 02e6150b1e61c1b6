use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::gateway::{NearbySearch, PlacesGateway};
use super::metrics::{MetricPayload, StationKind, TransitMetrics, TransitStation};
use super::{LayerData, LayerProvider, ProviderError};
use crate::geo::math::circle_ring;
use crate::geo::{haversine_km, Location};
use crate::overlay::layers::LayerId;
use crate::render::{AltitudeMode, Color, PolygonPrimitive, PolylinePrimitive, Primitive};

pub const SEARCH_RADIUS_METERS: f64 = 1500.0;
const STATION_RADIUS_METERS: f64 = 20.0;
const TRANSIT_BLUE: Color = Color::opaque(33, 150, 243);

#[derive(Debug, Clone)]
pub struct TransitProvider {
    places: Arc<dyn PlacesGateway>,
}

impl TransitProvider {
    pub fn new(places: Arc<dyn PlacesGateway>) -> Self {
        Self { places }
    }
}

impl LayerProvider for TransitProvider {
    fn layer(&self) -> LayerId {
        LayerId::Transit
    }

    fn load(&self, location: Location) -> BoxFuture<'_, Result<LayerData, ProviderError>> {
        async move {
            let places = self
                .places
                .nearby_search(NearbySearch {
                    location: location.position(),
                    radius_meters: SEARCH_RADIUS_METERS,
                    types: StationKind::PLACE_TYPES.to_vec(),
                })
                .await
                .map_err(ProviderError::gateway(LayerId::Transit))?;

            let stations: Vec<TransitStation> = places
                .into_iter()
                .map(|place| TransitStation {
                    distance_km: haversine_km(place.location, location.position()),
                    kind: StationKind::classify(place.types.iter().map(String::as_str)),
                    place_id: place.place_id,
                    name: place.name,
                    location: place.location,
                })
                .collect();

            tracing::debug!(count = stations.len(), "transit stations found");
            let primitives = stations
                .iter()
                .flat_map(|station| station_primitives(station, &location))
                .collect();

            Ok(LayerData {
                primitives,
                payload: MetricPayload::Transit(TransitMetrics { stations }),
                notice: None,
            })
        }
        .boxed()
    }
}

/// Station disc plus a connector line back to the viewed location.
fn station_primitives(station: &TransitStation, location: &Location) -> [Primitive; 2] {
    [
        Primitive::Polygon(PolygonPrimitive {
            outer_coordinates: circle_ring(station.location, STATION_RADIUS_METERS, 32, 30.0),
            stroke_color: TRANSIT_BLUE,
            stroke_width: 2.0,
            fill_color: TRANSIT_BLUE.with_alpha(0.3),
            altitude_mode: AltitudeMode::RelativeToGround,
            extruded: true,
            draws_occluded_segments: true,
            label: Some(format!(
                "{} - {:.2}km away",
                station.name, station.distance_km
            )),
        }),
        Primitive::Polyline(PolylinePrimitive {
            coordinates: vec![
                location.position().at_altitude(20.0),
                station.location.at_altitude(20.0),
            ],
            stroke_color: TRANSIT_BLUE.with_alpha(0.5),
            stroke_width: 3.0,
            altitude_mode: AltitudeMode::RelativeToGround,
            geodesic: true,
        }),
    ]
}
