use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::gateway::{BuildingInsightsResponse, SolarGateway};
use super::metrics::{MetricPayload, SolarMetrics};
use super::{LayerData, LayerProvider, ProviderError};
use crate::geo::Location;
use crate::overlay::layers::LayerId;
use crate::overlay::roof::{project_roof_segment, SolarEfficiency};
use crate::render::{AltitudeMode, Color, PolygonPrimitive, Primitive};

const OUTLINE_STROKE: Color = Color::opaque(255, 255, 255);

#[derive(Debug, Clone)]
pub struct SolarProvider {
    gateway: Arc<dyn SolarGateway>,
}

impl SolarProvider {
    pub fn new(gateway: Arc<dyn SolarGateway>) -> Self {
        Self { gateway }
    }
}

impl LayerProvider for SolarProvider {
    fn layer(&self) -> LayerId {
        LayerId::Solar
    }

    fn load(&self, location: Location) -> BoxFuture<'_, Result<LayerData, ProviderError>> {
        async move {
            let response = self
                .gateway
                .building_insights(location.position())
                .await
                .map_err(ProviderError::gateway(LayerId::Solar))?;

            let metrics = normalize(response);
            tracing::debug!(
                segments = metrics.segments.len(),
                total_area = metrics.total_area(),
                "building insights loaded"
            );
            let primitives = building_primitives(&metrics);

            Ok(LayerData {
                primitives,
                payload: MetricPayload::Solar(metrics),
                notice: None,
            })
        }
        .boxed()
    }
}

pub(crate) fn normalize(response: BuildingInsightsResponse) -> SolarMetrics {
    let building_box = response.bounding_box.map(Into::into);
    let Some(potential) = response.solar_potential else {
        return SolarMetrics {
            building_box,
            ..SolarMetrics::default()
        };
    };

    SolarMetrics {
        building_box,
        segments: potential
            .roof_segment_stats
            .into_iter()
            .map(Into::into)
            .collect(),
        max_sunshine_hours_per_year: potential.max_sunshine_hours_per_year,
        max_array_area_meters2: potential.max_array_area_meters2,
        carbon_offset_factor_kg_per_mwh: potential.carbon_offset_factor_kg_per_mwh,
        panel_config_count: potential.solar_panel_configs.len(),
    }
}

/// Building outline at the main segment's height followed by one polygon per
/// roof segment. Nothing is drawn for a building without segments.
fn building_primitives(metrics: &SolarMetrics) -> Vec<Primitive> {
    let Some(main) = metrics.largest_segment() else {
        return Vec::new();
    };

    let mut primitives = Vec::with_capacity(metrics.segments.len() + 1);
    if let Some(building_box) = metrics.building_box {
        primitives.push(Primitive::Polygon(PolygonPrimitive {
            outer_coordinates: building_box.ring(main.plane_height_at_center_meters + 1.0),
            stroke_color: OUTLINE_STROKE,
            stroke_width: 2.0,
            fill_color: Color::rgba(100, 100, 100, 0.5),
            altitude_mode: AltitudeMode::Absolute,
            extruded: true,
            draws_occluded_segments: true,
            label: Some("Building outline".to_string()),
        }));
    }

    for (index, segment) in metrics.segments.iter().enumerate() {
        let efficiency = SolarEfficiency::from_quantiles(&segment.stats.sunshine_quantiles);
        primitives.push(Primitive::Polygon(PolygonPrimitive {
            outer_coordinates: project_roof_segment(segment),
            stroke_color: OUTLINE_STROKE,
            stroke_width: 2.0,
            fill_color: efficiency.fill_color(),
            altitude_mode: AltitudeMode::Absolute,
            extruded: false,
            draws_occluded_segments: true,
            label: Some(format!(
                "Roof segment {} ({})",
                index + 1,
                efficiency.label()
            )),
        }));
    }

    primitives
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::providers::gateway::{SolarPotential, WireBox, WireRoofSegment, WireRoofStats};

    fn wire_segment(area: f64, sunshine: f64, height: f64) -> WireRoofSegment {
        WireRoofSegment {
            pitch_degrees: Some(18.0),
            azimuth_degrees: Some(170.0),
            plane_height_at_center_meters: Some(height),
            stats: WireRoofStats {
                area_meters2: area,
                sunshine_quantiles: vec![sunshine; 11],
            },
            ..WireRoofSegment::default()
        }
    }

    #[test]
    fn outline_sits_one_meter_above_the_largest_segment() {
        let response = BuildingInsightsResponse {
            bounding_box: Some(WireBox::default()),
            solar_potential: Some(SolarPotential {
                roof_segment_stats: vec![
                    wire_segment(20.0, 900.0, 6.0),
                    wire_segment(80.0, 1300.0, 9.0),
                ],
                solar_panel_configs: vec![serde_json::json!({}); 3],
                ..SolarPotential::default()
            }),
        };

        let metrics = normalize(response);
        assert_eq!(metrics.panel_config_count, 3);
        let primitives = building_primitives(&metrics);
        assert_eq!(primitives.len(), 3);

        let Primitive::Polygon(outline) = &primitives[0] else {
            panic!("expected outline polygon");
        };
        assert!(outline.outer_coordinates.iter().all(|p| p.altitude == 10.0));

        let Primitive::Polygon(best) = &primitives[2] else {
            panic!("expected roof polygon");
        };
        assert_eq!(best.fill_color, SolarEfficiency::Excellent.fill_color());
    }

    #[test]
    fn missing_potential_yields_empty_metrics_and_no_geometry() {
        let metrics = normalize(BuildingInsightsResponse::default());
        assert!(metrics.segments.is_empty());
        assert!(building_primitives(&metrics).is_empty());
    }
}
