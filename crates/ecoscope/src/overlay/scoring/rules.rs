use super::ScoreComponent;
use crate::overlay::providers::{
    AirQualityMetrics, GreenSpaceMetrics, MetricPayload, SolarMetrics, TransitMetrics,
    WalkabilityMetrics,
};

/// AQI bands as (lower bound, base score, span, band width). Checked top-down.
const AQI_BANDS: [(f64, f64, f64, f64); 5] = [
    (80.0, 16.0, 4.0, 20.0),
    (60.0, 12.0, 3.8, 19.0),
    (40.0, 8.0, 3.8, 19.0),
    (20.0, 4.0, 3.8, 19.0),
    (1.0, 0.2, 3.6, 18.0),
];

pub(crate) fn score_payload(payload: &MetricPayload) -> (f64, Vec<ScoreComponent>) {
    match payload {
        MetricPayload::Walkability(metrics) => walkability(metrics),
        MetricPayload::AirQuality(metrics) => air_quality(metrics),
        MetricPayload::Solar(metrics) => solar(metrics),
        MetricPayload::GreenSpaces(metrics) => green_spaces(metrics),
        MetricPayload::Transit(metrics) => transit(metrics),
    }
}

/// `10 - 2 * km`, clamped; no measured distance earns nothing.
fn proximity(average_km: Option<f64>, cap: f64) -> f64 {
    average_km.map_or(0.0, |km| (10.0 - 2.0 * km).clamp(0.0, cap))
}

fn walkability(metrics: &WalkabilityMetrics) -> (f64, Vec<ScoreComponent>) {
    let count = metrics.total_amenities();
    let types = metrics.distinct_types();
    let average = metrics.average_distance_km();

    let amenity = (count as f64 * 2.0).min(15.0);
    let diversity = (types as f64 * 2.0).min(10.0);
    let nearby = proximity(average, 5.0);

    let components = vec![
        ScoreComponent::new("amenities", amenity, 15.0, format!("{count} amenities within walking distance")),
        ScoreComponent::new("diversity", diversity, 10.0, format!("{types} amenity types")),
        ScoreComponent::new(
            "proximity",
            nearby,
            5.0,
            match average {
                Some(km) => format!("average distance {km:.2} km"),
                None => "no amenities nearby".to_string(),
            },
        ),
    ];
    (amenity + diversity + nearby, components)
}

pub(crate) fn aqi_score(aqi: f64) -> f64 {
    AQI_BANDS
        .iter()
        .find(|(lower, ..)| aqi >= *lower)
        .map_or(0.0, |&(lower, base, span, width)| {
            base + (aqi - lower) / width * span
        })
        .clamp(0.0, 20.0)
}

fn air_quality(metrics: &AirQualityMetrics) -> (f64, Vec<ScoreComponent>) {
    let score = metrics.aqi.map_or(0.0, aqi_score);
    let notes = match (metrics.aqi, metrics.category.as_deref()) {
        (Some(aqi), Some(category)) => format!("AQI {aqi:.0} ({category})"),
        (Some(aqi), None) => format!("AQI {aqi:.0}"),
        (None, _) => "no AQI reported".to_string(),
    };
    (score, vec![ScoreComponent::new("aqi", score, 20.0, notes)])
}

fn solar(metrics: &SolarMetrics) -> (f64, Vec<ScoreComponent>) {
    let sunshine = metrics.area_weighted_sunshine();
    let score = sunshine.map_or(0.0, |hours| (hours / 50.0).clamp(0.0, 40.0));
    let notes = match sunshine {
        Some(hours) => format!(
            "{hours:.0} kWh/m²/year across {:.0} m² of roof",
            metrics.total_area()
        ),
        None => "no usable roof area".to_string(),
    };
    (score, vec![ScoreComponent::new("sunshine", score, 40.0, notes)])
}

fn green_spaces(metrics: &GreenSpaceMetrics) -> (f64, Vec<ScoreComponent>) {
    let count = metrics.count();
    let rating = metrics.average_rating().unwrap_or(0.0);
    let large_park_bonus = if metrics.has_large_park() { 3.0 } else { 0.0 };
    let types = metrics.park_types().len();

    let quantity = (count as f64 * 3.0).min(10.0);
    let nearby = proximity(metrics.average_distance_km(), 10.0);
    let quality = (rating + large_park_bonus + 0.5 * types as f64).min(10.0);

    let components = vec![
        ScoreComponent::new("quantity", quantity, 10.0, format!("{count} green spaces")),
        ScoreComponent::new("proximity", nearby, 10.0, "distance to nearby parks".to_string()),
        ScoreComponent::new(
            "quality",
            quality,
            10.0,
            format!("average rating {rating:.1}, {types} park types"),
        ),
    ];
    ((quantity + nearby + quality).min(30.0), components)
}

fn transit(metrics: &TransitMetrics) -> (f64, Vec<ScoreComponent>) {
    let count = metrics.count();
    let types = metrics.distinct_types();

    let stations = count as f64 * 3.0;
    let variety = types as f64 * 5.0;
    let nearby = proximity(metrics.average_distance_km(), 10.0);

    let components = vec![
        ScoreComponent::new("stations", stations, 30.0, format!("{count} stations nearby")),
        ScoreComponent::new("variety", variety, 30.0, format!("{types} transit types")),
        ScoreComponent::new("proximity", nearby, 10.0, "distance to stations".to_string()),
    ];
    ((stations + variety + nearby).min(30.0), components)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use approx::assert_relative_eq;

    use super::*;
    use crate::geo::LatLng;
    use crate::overlay::providers::{Amenity, GreenSpace, StationKind, TransitStation};

    fn amenity(kind: &str, distance_km: f64) -> Amenity {
        Amenity {
            name: format!("{kind} spot"),
            kind: kind.to_string(),
            distance_km,
            location: LatLng::default(),
        }
    }

    #[test]
    fn eight_amenities_over_three_types_scores_twenty_six() {
        let mut amenities = BTreeMap::new();
        amenities.insert("cafe".to_string(), vec![amenity("cafe", 0.6); 3]);
        amenities.insert("park".to_string(), vec![amenity("park", 0.6); 3]);
        amenities.insert("school".to_string(), vec![amenity("school", 0.6); 2]);
        amenities.insert("pharmacy".to_string(), Vec::new());

        let (score, components) = walkability(&WalkabilityMetrics { amenities });
        assert_relative_eq!(score, 26.0);
        assert_eq!(components.len(), 3);
        assert_relative_eq!(components[0].score, 15.0);
        assert_relative_eq!(components[1].score, 6.0);
        assert_relative_eq!(components[2].score, 5.0);
    }

    #[test]
    fn empty_walkability_has_no_proximity_credit() {
        let (score, _) = walkability(&WalkabilityMetrics::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn aqi_forty_five_lands_near_nine() {
        assert_relative_eq!(aqi_score(45.0), 9.0, epsilon = 0.01);
    }

    #[test]
    fn aqi_bands_are_bounded() {
        assert_eq!(aqi_score(0.5), 0.0);
        assert_relative_eq!(aqi_score(1.0), 0.2);
        assert_relative_eq!(aqi_score(100.0), 20.0);
        assert_eq!(aqi_score(250.0), 20.0);
        let mut previous = 0.0;
        for aqi in 0..=100 {
            let score = aqi_score(f64::from(aqi));
            assert!(score >= previous, "aqi {aqi} dropped to {score}");
            previous = score;
        }
    }

    #[test]
    fn green_spaces_cap_quality_and_ignore_generic_types() {
        let space = |rating: f64, area: f64| GreenSpace {
            place_id: String::new(),
            name: "Park".into(),
            location: LatLng::default(),
            area_meters2: area,
            distance_km: 1.0,
            types: vec!["park".into(), "point_of_interest".into(), "establishment".into()],
            rating: Some(rating),
            user_ratings_total: Some(10),
        };
        let metrics = GreenSpaceMetrics {
            spaces: vec![space(4.5, 20_000.0), space(4.5, 100.0)],
        };
        let (score, components) = green_spaces(&metrics);
        assert_relative_eq!(components[0].score, 6.0);
        assert_relative_eq!(components[1].score, 8.0);
        // 4.5 rating + 3 bonus + 0.5 for the one counted type
        assert_relative_eq!(components[2].score, 8.0);
        assert_relative_eq!(score, 22.0);
    }

    #[test]
    fn transit_is_capped_at_thirty() {
        let station = |kind| TransitStation {
            place_id: String::new(),
            name: "Stop".into(),
            location: LatLng::default(),
            distance_km: 0.5,
            kind,
        };
        let few = TransitMetrics {
            stations: vec![station(StationKind::Bus)],
        };
        assert_relative_eq!(transit(&few).0, 3.0 + 5.0 + 9.0);

        let many = TransitMetrics {
            stations: vec![
                station(StationKind::Bus),
                station(StationKind::Train),
                station(StationKind::Subway),
                station(StationKind::Bus),
            ],
        };
        assert_eq!(transit(&many).0, 30.0);
    }
}
