//! reqwest-backed gateways for the Google Maps Platform endpoints.

use std::collections::HashSet;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::gateway::{
    AirQualityGateway, AirQualityResponse, BuildingInsightsResponse, GatewayError, NearbySearch,
    Place, PlacesGateway, SolarGateway,
};
use crate::geo::{BoundingBox, LatLng};

pub const DEFAULT_AIR_QUALITY_URL: &str = "https://airquality.googleapis.com";
pub const DEFAULT_SOLAR_URL: &str = "https://solar.googleapis.com";
pub const DEFAULT_PLACES_URL: &str = "https://maps.googleapis.com";

const EXTRA_COMPUTATIONS: [&str; 5] = [
    "HEALTH_RECOMMENDATIONS",
    "DOMINANT_POLLUTANT_CONCENTRATION",
    "POLLUTANT_CONCENTRATION",
    "LOCAL_AQI",
    "POLLUTANT_ADDITIONAL_INFO",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
    pub air_quality_url: String,
    pub solar_url: String,
    pub places_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            air_quality_url: DEFAULT_AIR_QUALITY_URL.to_string(),
            solar_url: DEFAULT_SOLAR_URL.to_string(),
            places_url: DEFAULT_PLACES_URL.to_string(),
        }
    }
}

/// One client shared by the air quality, solar and places gateways.
#[derive(Debug, Clone)]
pub struct GoogleMapsClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoints: GoogleEndpoints,
}

impl GoogleMapsClient {
    pub fn new(api_key: Option<String>, endpoints: GoogleEndpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            endpoints,
        }
    }

    fn key(&self) -> Result<&str, GatewayError> {
        self.api_key
            .as_deref()
            .ok_or(GatewayError::MissingApiKey("Google Maps Platform"))
    }

    async fn nearby_single(
        &self,
        location: LatLng,
        radius_meters: f64,
        kind: &str,
    ) -> Result<Vec<Place>, GatewayError> {
        let key = self.key()?;
        let request = self
            .client
            .get(format!(
                "{}/maps/api/place/nearbysearch/json",
                self.endpoints.places_url
            ))
            .query(&[
                ("location", format!("{},{}", location.lat, location.lng)),
                ("radius", radius_meters.to_string()),
                ("type", kind.to_string()),
                ("key", key.to_string()),
            ]);

        let envelope: PlacesEnvelope<WirePlace> = send_json(request).await?;
        envelope
            .into_results()
            .map(|places| places.into_iter().map(Place::from).collect())
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, GatewayError> {
    let response = request
        .send()
        .await
        .map_err(|err| GatewayError::Transport(err.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| GatewayError::Transport(err.to_string()))?;
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|err| GatewayError::Decode(err.to_string()))
}

impl AirQualityGateway for GoogleMapsClient {
    fn current_conditions(
        &self,
        at: LatLng,
    ) -> BoxFuture<'_, Result<AirQualityResponse, GatewayError>> {
        async move {
            let key = self.key()?;
            let request = self
                .client
                .post(format!(
                    "{}/v1/currentConditions:lookup",
                    self.endpoints.air_quality_url
                ))
                .query(&[("key", key)])
                .json(&json!({
                    "location": {"latitude": at.lat, "longitude": at.lng},
                    "extraComputations": EXTRA_COMPUTATIONS,
                }));
            send_json(request).await
        }
        .boxed()
    }
}

impl SolarGateway for GoogleMapsClient {
    fn building_insights(
        &self,
        at: LatLng,
    ) -> BoxFuture<'_, Result<BuildingInsightsResponse, GatewayError>> {
        async move {
            let key = self.key()?;
            let request = self
                .client
                .get(format!(
                    "{}/v1/buildingInsights:findClosest",
                    self.endpoints.solar_url
                ))
                .query(&[
                    ("location.latitude", at.lat.to_string()),
                    ("location.longitude", at.lng.to_string()),
                    ("key", key.to_string()),
                ]);
            send_json(request).await
        }
        .boxed()
    }
}

impl PlacesGateway for GoogleMapsClient {
    /// The legacy nearby search takes a single type, so each filter is its own
    /// request and results are merged by place id in arrival order.
    fn nearby_search(&self, request: NearbySearch) -> BoxFuture<'_, Result<Vec<Place>, GatewayError>> {
        async move {
            let mut seen = HashSet::new();
            let mut merged = Vec::new();
            for kind in &request.types {
                let places = self
                    .nearby_single(request.location, request.radius_meters, kind)
                    .await?;
                merged.extend(
                    places
                        .into_iter()
                        .filter(|place| seen.insert(place.place_id.clone())),
                );
            }
            tracing::debug!(
                types = ?request.types,
                radius = request.radius_meters,
                results = merged.len(),
                "nearby search complete"
            );
            Ok(merged)
        }
        .boxed()
    }

    fn geocode(&self, place_id: String) -> BoxFuture<'_, Result<LatLng, GatewayError>> {
        async move {
            let key = self.key()?;
            let request = self
                .client
                .get(format!("{}/maps/api/geocode/json", self.endpoints.places_url))
                .query(&[("place_id", place_id.as_str()), ("key", key)]);

            let envelope: PlacesEnvelope<WireGeocodeResult> = send_json(request).await?;
            envelope
                .into_results()?
                .into_iter()
                .next()
                .map(|result| result.geometry.location.into())
                .ok_or_else(|| GatewayError::Rejected(format!("no geocode result for {place_id}")))
        }
        .boxed()
    }
}

/// Status envelope shared by the legacy places and geocoding APIs.
#[derive(Debug, Deserialize)]
struct PlacesEnvelope<T> {
    status: String,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
    error_message: Option<String>,
}

impl<T> PlacesEnvelope<T> {
    fn into_results(self) -> Result<Vec<T>, GatewayError> {
        match self.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(self.results),
            other => Err(GatewayError::Rejected(match self.error_message {
                Some(message) => format!("{other}: {message}"),
                None => other.to_string(),
            })),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct WirePoint {
    lat: f64,
    lng: f64,
}

impl From<WirePoint> for LatLng {
    fn from(value: WirePoint) -> Self {
        LatLng::new(value.lat, value.lng)
    }
}

#[derive(Debug, Deserialize)]
struct WireViewport {
    northeast: WirePoint,
    southwest: WirePoint,
}

#[derive(Debug, Default, Deserialize)]
struct WireGeometry {
    #[serde(default)]
    location: WirePoint,
    viewport: Option<WireViewport>,
}

#[derive(Debug, Deserialize)]
struct WirePlace {
    place_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    geometry: WireGeometry,
    #[serde(default)]
    types: Vec<String>,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
}

impl From<WirePlace> for Place {
    fn from(value: WirePlace) -> Self {
        Place {
            place_id: value.place_id,
            name: value.name,
            location: value.geometry.location.into(),
            viewport: value.geometry.viewport.map(|viewport| BoundingBox {
                sw: viewport.southwest.into(),
                ne: viewport.northeast.into(),
            }),
            types: value.types,
            rating: value.rating,
            user_ratings_total: value.user_ratings_total,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireGeocodeResult {
    geometry: WireGeometry,
}
