//! The five data providers. Each turns a location into render primitives plus
//! one normalized [`MetricPayload`].

mod air_quality;
pub mod gateway;
pub mod google;
mod green_spaces;
pub mod metrics;
mod solar;
#[cfg(test)]
mod testing;
mod transit;
mod walkability;

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::geo::Location;
use crate::overlay::layers::LayerId;
use crate::render::Primitive;

pub use air_quality::AirQualityProvider;
pub use gateway::{
    AirQualityGateway, GatewayError, NearbySearch, Place, PlacesGateway, SolarGateway,
};
pub use green_spaces::GreenSpacesProvider;
pub use metrics::{
    AirQualityMetrics, Amenity, GreenSpace, GreenSpaceMetrics, MetricPayload, PayloadStore,
    SolarMetrics, StationKind, TransitMetrics, TransitStation, WalkabilityMetrics,
};
pub use solar::SolarProvider;
pub use transit::TransitProvider;
pub use walkability::{WalkabilityProvider, WALKABLE_PLACE_TYPES, WALKING_RADIUS_KM};

/// Everything one provider invocation yields.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerData {
    pub primitives: Vec<Primitive>,
    pub payload: MetricPayload,
    /// Optional success message surfaced to the viewer.
    pub notice: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{layer} lookup failed: {source}")]
    Gateway {
        layer: LayerId,
        #[source]
        source: GatewayError,
    },
    #[error("no provider registered for {0}")]
    Unregistered(LayerId),
}

impl ProviderError {
    pub(crate) fn gateway(layer: LayerId) -> impl FnOnce(GatewayError) -> Self {
        move |source| Self::Gateway { layer, source }
    }

    pub fn layer(&self) -> LayerId {
        match self {
            Self::Gateway { layer, .. } | Self::Unregistered(layer) => *layer,
        }
    }
}

/// A data source for one layer. The location is passed by value at call time
/// so a later location change cannot alter an in-flight request.
pub trait LayerProvider: Debug + Send + Sync {
    fn layer(&self) -> LayerId;
    fn load(&self, location: Location) -> BoxFuture<'_, Result<LayerData, ProviderError>>;
}

#[derive(Debug, Clone, Default)]
pub struct ProviderSet {
    providers: BTreeMap<LayerId, Arc<dyn LayerProvider>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires all five providers onto the given gateways.
    pub fn from_gateways(
        air_quality: Arc<dyn AirQualityGateway>,
        solar: Arc<dyn SolarGateway>,
        places: Arc<dyn PlacesGateway>,
    ) -> Self {
        Self::new()
            .with(AirQualityProvider::new(air_quality))
            .with(SolarProvider::new(solar))
            .with(WalkabilityProvider::new(places.clone()))
            .with(GreenSpacesProvider::new(places.clone()))
            .with(TransitProvider::new(places))
    }

    pub fn with<P>(mut self, provider: P) -> Self
    where
        P: LayerProvider + 'static,
    {
        self.providers.insert(provider.layer(), Arc::new(provider));
        self
    }

    pub fn insert(&mut self, provider: Arc<dyn LayerProvider>) {
        self.providers.insert(provider.layer(), provider);
    }

    pub fn get(&self, layer: LayerId) -> Result<Arc<dyn LayerProvider>, ProviderError> {
        self.providers
            .get(&layer)
            .cloned()
            .ok_or(ProviderError::Unregistered(layer))
    }
}
