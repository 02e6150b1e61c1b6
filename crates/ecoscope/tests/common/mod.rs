#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ecoscope::geo::{LatLng, Location};
use ecoscope::overlay::insights::{InsightsError, InsightsGateway};
use ecoscope::overlay::providers::gateway::{
    AirQualityResponse, AqiIndex, BuildingInsightsResponse, SolarPotential, WireBox, WireLatLng,
    WireRoofSegment, WireRoofStats,
};
use ecoscope::overlay::providers::{
    AirQualityGateway, GatewayError, LayerData, LayerProvider, NearbySearch, Place, PlacesGateway,
    ProviderError, ProviderSet, SolarGateway, TransitProvider,
};
use ecoscope::overlay::{AnalysisSession, LayerId};
use ecoscope::render::{Primitive, PrimitiveHandle, RenderSurface};
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;

#[derive(Debug, Default)]
pub struct SceneSurface {
    next: AtomicU64,
    attached: Mutex<BTreeMap<PrimitiveHandle, Primitive>>,
}

impl SceneSurface {
    pub fn len(&self) -> usize {
        self.attached.lock().expect("scene mutex poisoned").len()
    }
}

impl RenderSurface for SceneSurface {
    fn attach(&self, primitive: Primitive) -> PrimitiveHandle {
        let handle = PrimitiveHandle(self.next.fetch_add(1, Ordering::Relaxed));
        self.attached
            .lock()
            .expect("scene mutex poisoned")
            .insert(handle, primitive);
        handle
    }

    fn detach(&self, handle: PrimitiveHandle) {
        self.attached
            .lock()
            .expect("scene mutex poisoned")
            .remove(&handle);
    }
}

#[derive(Debug)]
pub struct FixedAirQuality {
    pub aqi: f64,
}

impl AirQualityGateway for FixedAirQuality {
    fn current_conditions(
        &self,
        _at: LatLng,
    ) -> BoxFuture<'_, Result<AirQualityResponse, GatewayError>> {
        let response = AirQualityResponse {
            indexes: vec![AqiIndex {
                aqi: Some(self.aqi),
                category: Some("Good air quality".into()),
                ..AqiIndex::default()
            }],
            dominant_pollutant: Some("pm25".into()),
            ..AirQualityResponse::default()
        };
        async move { Ok(response) }.boxed()
    }
}

/// One south-facing segment with uniform sunshine.
#[derive(Debug)]
pub struct FixedSolar {
    pub sunshine: f64,
}

impl SolarGateway for FixedSolar {
    fn building_insights(
        &self,
        at: LatLng,
    ) -> BoxFuture<'_, Result<BuildingInsightsResponse, GatewayError>> {
        let corner = |dlat: f64, dlng: f64| WireLatLng {
            latitude: at.lat + dlat,
            longitude: at.lng + dlng,
        };
        let bounds = WireBox {
            sw: corner(-0.0001, -0.0001),
            ne: corner(0.0001, 0.0001),
        };
        let response = BuildingInsightsResponse {
            bounding_box: Some(bounds),
            solar_potential: Some(SolarPotential {
                max_sunshine_hours_per_year: Some(self.sunshine),
                max_array_area_meters2: Some(60.0),
                carbon_offset_factor_kg_per_mwh: Some(428.0),
                roof_segment_stats: vec![WireRoofSegment {
                    pitch_degrees: Some(25.0),
                    azimuth_degrees: Some(180.0),
                    plane_height_at_center_meters: Some(7.5),
                    center: corner(0.0, 0.0),
                    bounding_box: bounds,
                    stats: WireRoofStats {
                        area_meters2: 60.0,
                        sunshine_quantiles: vec![self.sunshine; 11],
                    },
                }],
                solar_panel_configs: Vec::new(),
            }),
        };
        async move { Ok(response) }.boxed()
    }
}

/// Returns the same handful of places for every type filter, plus a fixed
/// geocode table.
#[derive(Debug, Default)]
pub struct NeighbourhoodPlaces {
    pub geocodes: BTreeMap<String, LatLng>,
}

impl PlacesGateway for NeighbourhoodPlaces {
    fn nearby_search(&self, request: NearbySearch) -> BoxFuture<'_, Result<Vec<Place>, GatewayError>> {
        let origin = request.location;
        let places = request
            .types
            .iter()
            .enumerate()
            .map(|(n, kind)| Place {
                place_id: format!("{kind}-{n}"),
                name: format!("Nearby {kind}"),
                location: LatLng::new(origin.lat + 0.002, origin.lng),
                types: vec![kind.to_string()],
                rating: Some(4.0),
                ..Place::default()
            })
            .collect();
        async move { Ok(places) }.boxed()
    }

    fn geocode(&self, place_id: String) -> BoxFuture<'_, Result<LatLng, GatewayError>> {
        let found = self
            .geocodes
            .get(&place_id)
            .copied()
            .ok_or_else(|| GatewayError::Rejected(format!("ZERO_RESULTS for {place_id}")));
        async move { found }.boxed()
    }
}

#[derive(Debug, Default)]
pub struct CannedInsights {
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl InsightsGateway for CannedInsights {
    fn generate(&self, prompt: String) -> BoxFuture<'_, Result<String, InsightsError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("prompt log mutex poisoned")
            .push(prompt);
        async move { Ok("## Strengths\n- Walkable core".to_string()) }.boxed()
    }
}

pub struct Fixture {
    pub session: Arc<AnalysisSession<SceneSurface>>,
    pub surface: Arc<SceneSurface>,
    pub insights: Arc<CannedInsights>,
}

/// Holds the wrapped provider's first load until the sender fires.
#[derive(Debug)]
pub struct GatedLayer {
    inner: Arc<dyn LayerProvider>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl GatedLayer {
    pub fn new(inner: Arc<dyn LayerProvider>) -> (Self, oneshot::Sender<()>) {
        let (release, gate) = oneshot::channel();
        let layer = Self {
            inner,
            gate: Mutex::new(Some(gate)),
        };
        (layer, release)
    }
}

impl LayerProvider for GatedLayer {
    fn layer(&self) -> LayerId {
        self.inner.layer()
    }

    fn load(&self, location: Location) -> BoxFuture<'_, Result<LayerData, ProviderError>> {
        let gate = self.gate.lock().expect("gate mutex poisoned").take();
        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.inner.load(location).await
        }
        .boxed()
    }
}

pub fn fixture() -> Fixture {
    build_fixture(|providers, _| providers)
}

/// Same neighbourhood, but the transit load waits for the returned sender.
pub fn fixture_with_gated_transit() -> (Fixture, oneshot::Sender<()>) {
    let mut release = None;
    let fx = build_fixture(|providers, places| {
        let (gated, sender) = GatedLayer::new(Arc::new(TransitProvider::new(places)));
        release = Some(sender);
        providers.with(gated)
    });
    (fx, release.expect("transit gate installed"))
}

fn build_fixture(
    customise: impl FnOnce(ProviderSet, Arc<dyn PlacesGateway>) -> ProviderSet,
) -> Fixture {
    let surface = Arc::new(SceneSurface::default());
    let mut places = NeighbourhoodPlaces::default();
    places
        .geocodes
        .insert("waterloo-park".into(), LatLng::new(43.4643, -80.5294));
    let places: Arc<dyn PlacesGateway> = Arc::new(places);
    let insights = Arc::new(CannedInsights::default());

    let providers = customise(
        ProviderSet::from_gateways(
            Arc::new(FixedAirQuality { aqi: 45.0 }),
            Arc::new(FixedSolar { sunshine: 1600.0 }),
            places.clone(),
        ),
        places.clone(),
    );
    let session = Arc::new(AnalysisSession::new(
        surface.clone(),
        providers,
        places,
        insights.clone(),
        Location::default(),
    ));

    Fixture {
        session,
        surface,
        insights,
    }
}
