use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::geo::{LatLng, Location};
use crate::overlay::insights::{InsightsGateway, InsightsRequester, InsightsStatus, InsightsView};
use crate::overlay::layers::LayerId;
use crate::overlay::lifecycle::{
    LayerLifecycleManager, LifecycleError, LifecycleSnapshot, Severity, VisibleOutcome,
};
use crate::overlay::providers::{GatewayError, PlacesGateway, ProviderSet};
use crate::overlay::scoring::{CompositeScoringEngine, ScoreReport};
use crate::render::RenderSurface;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("place lookup failed: {0}")]
    Search(#[source] GatewayError),
    #[error("invalid location: {0}")]
    InvalidLocation(String),
}

impl SessionError {
    /// True when the failure came from an external service rather than the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Search(_) | Self::Lifecycle(LifecycleError::Provider(_))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerView {
    pub id: LayerId,
    pub label: &'static str,
    pub description: &'static str,
    pub active: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub layers: Vec<LayerView>,
    #[serde(flatten)]
    pub lifecycle: LifecycleSnapshot,
    pub insights: InsightsStatus,
}

/// The one analysis session: layer lifecycle, scoring and insights together.
pub struct AnalysisSession<S> {
    manager: Arc<LayerLifecycleManager<S>>,
    places: Arc<dyn PlacesGateway>,
    insights: Arc<InsightsRequester>,
    engine: CompositeScoringEngine,
    pending_insights: Mutex<Option<JoinHandle<()>>>,
}

impl<S> AnalysisSession<S>
where
    S: RenderSurface + 'static,
{
    pub fn new(
        surface: Arc<S>,
        providers: ProviderSet,
        places: Arc<dyn PlacesGateway>,
        insights: Arc<dyn InsightsGateway>,
        initial: Location,
    ) -> Self {
        Self {
            manager: Arc::new(LayerLifecycleManager::new(surface, providers, initial)),
            places,
            insights: Arc::new(InsightsRequester::new(insights)),
            engine: CompositeScoringEngine,
            pending_insights: Mutex::new(None),
        }
    }

    pub fn manager(&self) -> &LayerLifecycleManager<S> {
        &self.manager
    }

    /// Switching a layer on fires the insights check before its data loads,
    /// so the request sees the activation set at that instant.
    pub async fn toggle(&self, layer: LayerId) -> Result<bool, SessionError> {
        if self.manager.activation().is_active(layer) {
            self.manager.deactivate(layer);
            return Ok(false);
        }

        self.activate(layer);
        self.manager.select_panel(layer).await?;
        Ok(true)
    }

    pub fn activate(&self, layer: LayerId) -> bool {
        let changed = self.manager.activate(layer);
        self.request_insights_if_complete();
        changed
    }

    pub fn deactivate(&self, layer: LayerId) -> bool {
        self.manager.deactivate(layer)
    }

    pub async fn set_visible(&self, layer: Option<LayerId>) -> Result<VisibleOutcome, SessionError> {
        Ok(self.manager.set_visible(layer).await?)
    }

    pub async fn select_panel(&self, layer: LayerId) -> Result<Option<VisibleOutcome>, SessionError> {
        Ok(self.manager.select_panel(layer).await?)
    }

    pub async fn change_location(
        &self,
        location: Location,
    ) -> Result<Option<VisibleOutcome>, SessionError> {
        validate(&location)?;
        Ok(self.manager.on_location_change(location).await?)
    }

    /// Resolves a place id and moves the session there.
    pub async fn search_place(&self, place_id: &str) -> Result<Location, SessionError> {
        let position: LatLng = match self.places.geocode(place_id.to_string()).await {
            Ok(position) => position,
            Err(err) => {
                tracing::warn!(place_id, error = %err, "place lookup failed");
                self.manager
                    .notify(Severity::Error, format!("Could not find that place: {err}"));
                return Err(SessionError::Search(err));
            }
        };

        let location = Location::from_search(position);
        self.change_location(location).await?;
        Ok(location)
    }

    pub fn score(&self) -> ScoreReport {
        self.engine
            .evaluate(&self.manager.activation(), &self.manager.payloads())
    }

    pub fn insights(&self) -> InsightsView {
        self.insights.view()
    }

    pub fn state(&self) -> SessionState {
        let lifecycle = self.manager.snapshot();
        let layers = LayerId::ordered()
            .into_iter()
            .map(|id| LayerView {
                id,
                label: id.label(),
                description: id.description(),
                active: lifecycle.active.contains(&id),
                visible: lifecycle.visible == Some(id),
            })
            .collect();

        SessionState {
            layers,
            lifecycle,
            insights: self.insights.view().status,
        }
    }

    /// Waits for a spawned insights request, if one is outstanding.
    pub async fn insights_settled(&self) -> InsightsView {
        let pending = self
            .pending_insights
            .lock()
            .expect("insights task mutex poisoned")
            .take();
        if let Some(task) = pending {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "insights task did not complete");
            }
        }
        self.insights.view()
    }

    fn request_insights_if_complete(&self) {
        let Some(prompt) = self
            .insights
            .claim(&self.manager.activation(), &self.manager.payloads())
        else {
            return;
        };

        let requester = Arc::clone(&self.insights);
        let task = tokio::spawn(async move {
            // Failure is already recorded in the slot.
            let _ = requester.submit(prompt).await;
        });
        *self
            .pending_insights
            .lock()
            .expect("insights task mutex poisoned") = Some(task);
    }
}

fn validate(location: &Location) -> Result<(), SessionError> {
    let in_range = location.lat.is_finite()
        && location.lng.is_finite()
        && (-90.0..=90.0).contains(&location.lat)
        && (-180.0..=180.0).contains(&location.lng);
    if in_range {
        Ok(())
    } else {
        Err(SessionError::InvalidLocation(format!(
            "({}, {}) is outside the valid coordinate range",
            location.lat, location.lng
        )))
    }
}
