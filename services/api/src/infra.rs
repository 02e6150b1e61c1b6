use ecoscope::config::AppConfig;
use ecoscope::overlay::insights::HttpInsightsClient;
use ecoscope::overlay::providers::google::GoogleMapsClient;
use ecoscope::overlay::providers::ProviderSet;
use ecoscope::overlay::AnalysisSession;
use ecoscope::render::{Primitive, PrimitiveHandle, RenderSurface};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) scene: Arc<SceneGraph>,
}

/// Headless render surface. Keeps attached primitives so clients can fetch
/// and draw them.
#[derive(Debug, Default)]
pub(crate) struct SceneGraph {
    next_handle: AtomicU64,
    nodes: Mutex<BTreeMap<PrimitiveHandle, Primitive>>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SceneNode {
    pub(crate) handle: PrimitiveHandle,
    #[serde(flatten)]
    pub(crate) primitive: Primitive,
}

impl SceneGraph {
    pub(crate) fn nodes(&self) -> Vec<SceneNode> {
        self.nodes
            .lock()
            .expect("scene graph mutex poisoned")
            .iter()
            .map(|(handle, primitive)| SceneNode {
                handle: *handle,
                primitive: primitive.clone(),
            })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.lock().expect("scene graph mutex poisoned").len()
    }
}

impl RenderSurface for SceneGraph {
    fn attach(&self, primitive: Primitive) -> PrimitiveHandle {
        let handle = PrimitiveHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.nodes
            .lock()
            .expect("scene graph mutex poisoned")
            .insert(handle, primitive);
        handle
    }

    fn detach(&self, handle: PrimitiveHandle) {
        let removed = self
            .nodes
            .lock()
            .expect("scene graph mutex poisoned")
            .remove(&handle);
        if removed.is_none() {
            tracing::warn!(handle = handle.0, "detach for unknown primitive");
        }
    }
}

/// Wires the session onto the configured upstream services.
pub(crate) fn build_session(
    config: &AppConfig,
    scene: Arc<SceneGraph>,
) -> AnalysisSession<SceneGraph> {
    let services = &config.services;
    if services.google_api_key.is_none() {
        tracing::warn!("GOOGLE_MAPS_API_KEY not set; layer loads will fail");
    }
    if services.insights_url.is_none() {
        tracing::warn!("INSIGHTS_API_URL not set; insights are disabled");
    }

    let google = Arc::new(GoogleMapsClient::new(
        services.google_api_key.clone(),
        services.google_endpoints(),
    ));
    let providers = ProviderSet::from_gateways(google.clone(), google.clone(), google.clone());
    let insights = Arc::new(HttpInsightsClient::new(services.insights_url.clone()));

    AnalysisSession::new(scene, providers, google, insights, config.initial_location)
}
