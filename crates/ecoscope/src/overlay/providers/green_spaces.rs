use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::gateway::{NearbySearch, Place, PlacesGateway};
use super::metrics::{GreenSpace, GreenSpaceMetrics, MetricPayload};
use super::{LayerData, LayerProvider, ProviderError};
use crate::geo::math::viewport_area_m2;
use crate::geo::{haversine_km, Location};
use crate::overlay::layers::LayerId;
use crate::render::{AltitudeMode, Color, PolygonPrimitive, Primitive};

pub const SEARCH_RADIUS_METERS: f64 = 2000.0;
const CANOPY_HEIGHT_METERS: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct GreenSpacesProvider {
    places: Arc<dyn PlacesGateway>,
}

impl GreenSpacesProvider {
    pub fn new(places: Arc<dyn PlacesGateway>) -> Self {
        Self { places }
    }
}

impl LayerProvider for GreenSpacesProvider {
    fn layer(&self) -> LayerId {
        LayerId::GreenSpaces
    }

    fn load(&self, location: Location) -> BoxFuture<'_, Result<LayerData, ProviderError>> {
        async move {
            let places = self
                .places
                .nearby_search(NearbySearch {
                    location: location.position(),
                    radius_meters: SEARCH_RADIUS_METERS,
                    types: vec!["park"],
                })
                .await
                .map_err(ProviderError::gateway(LayerId::GreenSpaces))?;

            tracing::debug!(count = places.len(), "green spaces found");
            let primitives = places.iter().flat_map(park_primitives).collect();
            let spaces = places
                .into_iter()
                .map(|place| to_green_space(place, &location))
                .collect();

            Ok(LayerData {
                primitives,
                payload: MetricPayload::GreenSpaces(GreenSpaceMetrics { spaces }),
                notice: None,
            })
        }
        .boxed()
    }
}

fn to_green_space(place: Place, location: &Location) -> GreenSpace {
    GreenSpace {
        area_meters2: place.viewport.as_ref().map_or(0.0, viewport_area_m2),
        distance_km: haversine_km(place.location, location.position()),
        place_id: place.place_id,
        name: place.name,
        location: place.location,
        types: place.types,
        rating: place.rating,
        user_ratings_total: place.user_ratings_total,
    }
}

/// Ground footprint plus an extruded canopy; places without a viewport are
/// scored but not drawn.
fn park_primitives(place: &Place) -> Vec<Primitive> {
    let Some(viewport) = place.viewport else {
        return Vec::new();
    };
    let label = format!("{} - Green Space", place.name);

    vec![
        Primitive::Polygon(PolygonPrimitive {
            outer_coordinates: viewport.ring(0.0),
            stroke_color: Color::opaque(0, 255, 0),
            stroke_width: 2.0,
            fill_color: Color::rgba(0, 255, 0, 0.3),
            altitude_mode: AltitudeMode::ClampToGround,
            extruded: false,
            draws_occluded_segments: true,
            label: Some(label.clone()),
        }),
        Primitive::Polygon(PolygonPrimitive {
            outer_coordinates: viewport.ring(CANOPY_HEIGHT_METERS),
            stroke_color: Color::rgba(0, 200, 0, 0.6),
            stroke_width: 1.0,
            fill_color: Color::rgba(0, 200, 0, 0.2),
            altitude_mode: AltitudeMode::RelativeToGround,
            extruded: true,
            draws_occluded_segments: true,
            label: Some(label),
        }),
    ]
}
