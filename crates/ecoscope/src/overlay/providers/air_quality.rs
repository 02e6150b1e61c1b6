use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;

use super::gateway::{AirQualityGateway, AirQualityResponse, WireColor};
use super::metrics::{AirQualityMetrics, MetricPayload};
use super::{LayerData, LayerProvider, ProviderError};
use crate::geo::math::circle_ring;
use crate::geo::{LatLng, Location};
use crate::overlay::layers::LayerId;
use crate::render::{AltitudeMode, Color, PolygonPrimitive, Primitive};

/// Concentric haze rings, outermost first.
const RING_RADII_KM: [f64; 4] = [2.0, 1.5, 1.0, 0.5];
const RING_SEGMENTS: usize = 32;
const HAZE: Color = Color::opaque(255, 0, 0);

#[derive(Debug, Clone)]
pub struct AirQualityProvider {
    gateway: Arc<dyn AirQualityGateway>,
}

impl AirQualityProvider {
    pub fn new(gateway: Arc<dyn AirQualityGateway>) -> Self {
        Self { gateway }
    }
}

impl LayerProvider for AirQualityProvider {
    fn layer(&self) -> LayerId {
        LayerId::AirQuality
    }

    fn load(&self, location: Location) -> BoxFuture<'_, Result<LayerData, ProviderError>> {
        async move {
            let response = self
                .gateway
                .current_conditions(location.position())
                .await
                .map_err(ProviderError::gateway(LayerId::AirQuality))?;

            let metrics = normalize(response);
            tracing::debug!(aqi = ?metrics.aqi, category = ?metrics.category, "air quality loaded");
            let primitives = haze_rings(location.position(), metrics.aqi.unwrap_or(0.0));

            Ok(LayerData {
                primitives,
                payload: MetricPayload::AirQuality(metrics),
                notice: None,
            })
        }
        .boxed()
    }
}

pub(crate) fn normalize(response: AirQualityResponse) -> AirQualityMetrics {
    let AirQualityResponse {
        indexes,
        dominant_pollutant,
        health_recommendations,
        date_time,
    } = response;

    let primary = indexes.into_iter().next().unwrap_or_default();
    let aqi = primary.aqi.or_else(|| {
        primary
            .aqi_display
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
    });

    AirQualityMetrics {
        aqi,
        category: primary.category,
        display_name: primary.display_name,
        color: primary.color.map(to_color),
        dominant_pollutant: dominant_pollutant.or(primary.dominant_pollutant),
        health_recommendations,
        updated_at: date_time.as_deref().and_then(parse_timestamp),
    }
}

fn to_color(wire: WireColor) -> Color {
    let channel = |value: f64| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::opaque(channel(wire.red), channel(wire.green), channel(wire.blue))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|stamp| stamp.with_timezone(&Utc))
        .ok()
}

fn haze_rings(center: LatLng, aqi: f64) -> Vec<Primitive> {
    let intensity = (aqi / 200.0).clamp(0.0, 1.0);

    RING_RADII_KM
        .iter()
        .enumerate()
        .map(|(index, radius_km)| {
            let step = index as f64;
            Primitive::Polygon(PolygonPrimitive {
                outer_coordinates: circle_ring(
                    center,
                    radius_km * 1000.0,
                    RING_SEGMENTS,
                    200.0 + step * 50.0,
                ),
                stroke_color: HAZE.with_alpha(intensity * 0.8),
                stroke_width: 1.0,
                fill_color: HAZE.with_alpha(intensity * (0.2 - step * 0.05)),
                altitude_mode: AltitudeMode::RelativeToGround,
                extruded: true,
                draws_occluded_segments: false,
                label: None,
            })
        })
        .collect()
}
