use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;

use crate::geo::{LatLng, Location};
use crate::overlay::layers::LayerId;
use crate::overlay::lifecycle::LayerLifecycleManager;
use crate::overlay::providers::{
    AirQualityMetrics, GatewayError, GreenSpaceMetrics, LayerData, LayerProvider, MetricPayload,
    ProviderError, ProviderSet, SolarMetrics, TransitMetrics, WalkabilityMetrics,
};
use crate::render::{
    AltitudeMode, Color, MarkerPrimitive, Primitive, PrimitiveHandle, RenderSurface,
};

/// Surface that remembers what is attached and every call made to it.
#[derive(Debug, Default)]
pub(super) struct RecordingSurface {
    next: AtomicU64,
    attached: Mutex<BTreeMap<PrimitiveHandle, Primitive>>,
    pub(super) detached: Mutex<Vec<PrimitiveHandle>>,
}

impl RecordingSurface {
    pub(super) fn attached_labels(&self) -> Vec<String> {
        self.attached
            .lock()
            .expect("surface mutex poisoned")
            .values()
            .filter_map(|primitive| match primitive {
                Primitive::Marker(marker) => Some(marker.label.clone()),
                _ => None,
            })
            .collect()
    }

    pub(super) fn attached_count(&self) -> usize {
        self.attached.lock().expect("surface mutex poisoned").len()
    }

    pub(super) fn detached_count(&self) -> usize {
        self.detached.lock().expect("surface mutex poisoned").len()
    }
}

impl RenderSurface for RecordingSurface {
    fn attach(&self, primitive: Primitive) -> PrimitiveHandle {
        let handle = PrimitiveHandle(self.next.fetch_add(1, Ordering::Relaxed));
        self.attached
            .lock()
            .expect("surface mutex poisoned")
            .insert(handle, primitive);
        handle
    }

    fn detach(&self, handle: PrimitiveHandle) {
        self.attached
            .lock()
            .expect("surface mutex poisoned")
            .remove(&handle);
        self.detached
            .lock()
            .expect("surface mutex poisoned")
            .push(handle);
    }
}

pub(super) fn marker(label: &str) -> Primitive {
    Primitive::Marker(MarkerPrimitive {
        position: LatLng::default().at_altitude(0.0),
        altitude_mode: AltitudeMode::RelativeToGround,
        icon_color: Color::opaque(0, 0, 0),
        label: label.to_string(),
    })
}

pub(super) fn empty_payload(layer: LayerId) -> MetricPayload {
    match layer {
        LayerId::AirQuality => MetricPayload::AirQuality(AirQualityMetrics::default()),
        LayerId::Solar => MetricPayload::Solar(SolarMetrics::default()),
        LayerId::Walkability => MetricPayload::Walkability(WalkabilityMetrics::default()),
        LayerId::GreenSpaces => MetricPayload::GreenSpaces(GreenSpaceMetrics::default()),
        LayerId::Transit => MetricPayload::Transit(TransitMetrics::default()),
    }
}

/// Labels each marker with the layer and the latitude it was loaded for, so
/// tests can tell which request produced the geometry on the surface.
pub(super) fn layer_data(layer: LayerId, location: Location, markers: usize) -> LayerData {
    LayerData {
        primitives: (0..markers)
            .map(|n| marker(&format!("{layer}@{}#{n}", location.lat)))
            .collect(),
        payload: empty_payload(layer),
        notice: None,
    }
}

/// Resolves immediately with `markers` primitives.
#[derive(Debug)]
pub(super) struct InstantProvider {
    pub(super) layer: LayerId,
    pub(super) markers: usize,
    pub(super) calls: Arc<Mutex<Vec<Location>>>,
}

impl InstantProvider {
    pub(super) fn new(layer: LayerId, markers: usize) -> Self {
        Self {
            layer,
            markers,
            calls: Arc::default(),
        }
    }
}

impl LayerProvider for InstantProvider {
    fn layer(&self) -> LayerId {
        self.layer
    }

    fn load(&self, location: Location) -> BoxFuture<'_, Result<LayerData, ProviderError>> {
        self.calls
            .lock()
            .expect("call log mutex poisoned")
            .push(location);
        let data = layer_data(self.layer, location, self.markers);
        async move { Ok(data) }.boxed()
    }
}

/// Waits for the test to release each call through the returned sender.
#[derive(Debug)]
pub(super) struct GatedProvider {
    layer: LayerId,
    gates: Mutex<VecDeque<oneshot::Receiver<Result<usize, GatewayError>>>>,
}

impl GatedProvider {
    pub(super) fn new(layer: LayerId) -> Self {
        Self {
            layer,
            gates: Mutex::default(),
        }
    }

    /// Queues the gate for the next load; send `Ok(markers)` to let it finish.
    pub(super) fn arm(&self) -> oneshot::Sender<Result<usize, GatewayError>> {
        let (sender, receiver) = oneshot::channel();
        self.gates
            .lock()
            .expect("gate mutex poisoned")
            .push_back(receiver);
        sender
    }
}

impl LayerProvider for GatedProvider {
    fn layer(&self) -> LayerId {
        self.layer
    }

    fn load(&self, location: Location) -> BoxFuture<'_, Result<LayerData, ProviderError>> {
        let gate = self.gates.lock().expect("gate mutex poisoned").pop_front();
        let layer = self.layer;
        async move {
            let released = match gate {
                Some(gate) => gate
                    .await
                    .unwrap_or_else(|_| Err(GatewayError::Transport("gate dropped".into()))),
                None => Err(GatewayError::Transport("provider not armed".into())),
            };
            released
                .map(|markers| layer_data(layer, location, markers))
                .map_err(ProviderError::gateway(layer))
        }
        .boxed()
    }
}

pub(super) fn instant_providers() -> ProviderSet {
    LayerId::ordered()
        .into_iter()
        .fold(ProviderSet::new(), |set, layer| {
            set.with(InstantProvider::new(layer, 2))
        })
}

pub(super) fn manager_with(
    providers: ProviderSet,
) -> (Arc<LayerLifecycleManager<RecordingSurface>>, Arc<RecordingSurface>) {
    let surface = Arc::new(RecordingSurface::default());
    let manager = Arc::new(LayerLifecycleManager::new(
        surface.clone(),
        providers,
        Location::default(),
    ));
    (manager, surface)
}

pub(super) fn moved_location() -> Location {
    Location::from_search(LatLng::new(43.4643, -80.5204))
}
