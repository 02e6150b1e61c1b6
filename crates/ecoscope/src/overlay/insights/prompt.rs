use std::fmt::Write;

use crate::overlay::providers::{PayloadStore, WALKING_RADIUS_KM};

const CLOSING_REQUEST: &str = "Based on the available data above, please provide in markdown format:
1. Key sustainability strengths of this location
2. Specific opportunities for improvement
3. Overall sustainability assessment

Please ensure your response uses proper markdown formatting with headers, bullet points, and emphasis where appropriate. Focus your analysis on the metrics that are present, providing actionable insights for the available data.";

fn or_unknown(value: Option<f64>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| format!("{v}"))
}

/// Assembles the analysis prompt from whatever payloads exist right now.
/// Sections without data are left out.
pub fn build_prompt(payloads: &PayloadStore) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(solar) = payloads.solar() {
        sections.push(format!(
            "Solar Potential Highlights:
- Maximum Sunshine Hours: {} hours/year
- Maximum Array Area: {} m²
- Carbon Offset Factor: {} kg/MWh",
            or_unknown(solar.max_sunshine_hours_per_year),
            or_unknown(solar.max_array_area_meters2),
            or_unknown(solar.carbon_offset_factor_kg_per_mwh),
        ));
    }

    if let Some(air) = payloads.air_quality().filter(|air| air.aqi.is_some()) {
        sections.push(format!(
            "Air Quality Overview:
- AQI: {}
- Category: {}
- Dominant Pollutant: {}",
            or_unknown(air.aqi),
            air.category.as_deref().unwrap_or("unknown"),
            air.dominant_pollutant.as_deref().unwrap_or("unknown"),
        ));
    }

    if let Some(green) = payloads.green_spaces().filter(|green| green.count() > 0) {
        sections.push(format!(
            "Green Space Assessment:
- Number of Areas: {}
- Average Rating: {:.1}",
            green.count(),
            green.average_rating().unwrap_or(0.0),
        ));
    }

    if let Some(transit) = payloads.transit().filter(|transit| transit.count() > 0) {
        let distribution = transit
            .distribution()
            .into_iter()
            .map(|(kind, count)| format!("{}: {count}", kind.place_type()))
            .collect::<Vec<_>>()
            .join(", ");
        sections.push(format!(
            "Transit Accessibility (1500m radius):
- Number of Stations: {}
- Distribution: {distribution}",
            transit.count(),
        ));
    }

    if let Some(walk) = payloads.walkability().filter(|walk| !walk.amenities.is_empty()) {
        let mut section = format!(
            "Walkability Analysis ({:.0}m radius):",
            WALKING_RADIUS_KM * 1000.0
        );
        for (kind, places) in &walk.amenities {
            let _ = write!(section, "\n- {kind}: {} locations", places.len());
        }
        sections.push(section);
    }

    let mut prompt = String::from(
        "Analyze the available sustainability metrics for this location. Focus on the strengths and opportunities based on the following data:\n\n",
    );
    for section in sections {
        prompt.push_str(&section);
        prompt.push_str("\n\n");
    }
    prompt.push_str(CLOSING_REQUEST);
    prompt
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::geo::LatLng;
    use crate::overlay::providers::{
        AirQualityMetrics, Amenity, MetricPayload, SolarMetrics, StationKind, TransitMetrics,
        TransitStation, WalkabilityMetrics,
    };

    #[test]
    fn empty_store_still_asks_for_an_assessment() {
        let prompt = build_prompt(&PayloadStore::default());
        assert!(prompt.starts_with("Analyze the available sustainability metrics"));
        assert!(prompt.ends_with("actionable insights for the available data."));
        assert!(!prompt.contains("Solar Potential Highlights"));
    }

    #[test]
    fn present_payloads_become_sections() {
        let station = |kind| TransitStation {
            place_id: String::new(),
            name: "Stop".into(),
            location: LatLng::default(),
            distance_km: 0.3,
            kind,
        };
        let mut amenities = BTreeMap::new();
        amenities.insert(
            "cafe".to_string(),
            vec![Amenity {
                name: "Bean".into(),
                kind: "cafe".into(),
                distance_km: 0.2,
                location: LatLng::default(),
            }],
        );
        amenities.insert("school".to_string(), Vec::new());

        let payloads: PayloadStore = [
            MetricPayload::Solar(SolarMetrics {
                max_sunshine_hours_per_year: Some(1620.5),
                max_array_area_meters2: Some(88.0),
                ..SolarMetrics::default()
            }),
            MetricPayload::AirQuality(AirQualityMetrics {
                aqi: Some(72.0),
                category: Some("Good air quality".into()),
                dominant_pollutant: Some("o3".into()),
                ..AirQualityMetrics::default()
            }),
            MetricPayload::Transit(TransitMetrics {
                stations: vec![
                    station(StationKind::Bus),
                    station(StationKind::Bus),
                    station(StationKind::Train),
                ],
            }),
            MetricPayload::Walkability(WalkabilityMetrics { amenities }),
        ]
        .into_iter()
        .collect();

        let prompt = build_prompt(&payloads);
        assert!(prompt.contains("- Maximum Sunshine Hours: 1620.5 hours/year"));
        assert!(prompt.contains("- Carbon Offset Factor: unknown kg/MWh"));
        assert!(prompt.contains("- AQI: 72\n- Category: Good air quality\n- Dominant Pollutant: o3"));
        assert!(prompt.contains("- Distribution: train_station: 1, bus_station: 2"));
        assert!(prompt.contains("Walkability Analysis (1200m radius):\n- cafe: 1 locations\n- school: 0 locations"));
        assert!(!prompt.contains("Green Space Assessment"));
    }
}
