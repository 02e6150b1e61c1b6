use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use super::notice::{NotificationLog, Severity};
use crate::geo::Location;
use crate::overlay::layers::{LayerActivationState, LayerId};
use crate::overlay::providers::{LayerData, PayloadStore, ProviderError, ProviderSet};
use crate::render::{LayerRenderHandle, RenderSurface};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("layer {0} is not active")]
    Inactive(LayerId),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// What a visibility request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VisibleOutcome {
    /// Already visible or already being loaded.
    Unchanged,
    Cleared,
    Attached { layer: LayerId, primitives: usize },
    /// A newer request started while this one was in flight.
    Discarded { layer: LayerId },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleSnapshot {
    pub active: Vec<LayerId>,
    pub visible: Option<LayerId>,
    pub loading: Option<LayerId>,
    pub selected_panel: Option<LayerId>,
    pub location: Location,
    pub generation: u64,
    pub attached_primitives: usize,
    pub notifications: NotificationLog,
}

#[derive(Debug, Default)]
struct ManagerState {
    activation: LayerActivationState,
    visible: Option<LayerId>,
    requested: Option<LayerId>,
    handles: BTreeMap<LayerId, LayerRenderHandle>,
    generation: u64,
    payloads: PayloadStore,
    location: Location,
    selected_panel: Option<LayerId>,
    notifications: NotificationLog,
}

impl ManagerState {
    /// Releases every attached handle, not only the visible one.
    fn teardown<S: RenderSurface + ?Sized>(&mut self, surface: &S) {
        for (layer, handle) in std::mem::take(&mut self.handles) {
            tracing::debug!(%layer, primitives = handle.len(), "detaching layer geometry");
            handle.release(surface);
        }
    }

    /// Invalidates any in-flight load and empties the surface.
    fn clear_visible<S: RenderSurface + ?Sized>(&mut self, surface: &S) {
        self.teardown(surface);
        self.visible = None;
        self.requested = None;
        self.generation += 1;
    }

    /// Starts a load for `layer`, returning the generation it must still
    /// match on completion and the location it runs against.
    fn begin_load<S: RenderSurface + ?Sized>(&mut self, surface: &S, layer: LayerId) -> LoadTicket {
        self.clear_visible(surface);
        self.requested = Some(layer);
        LoadTicket {
            layer,
            generation: self.generation,
            location: self.location,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LoadTicket {
    layer: LayerId,
    generation: u64,
    location: Location,
}

/// Single owner of layer visibility and of everything attached to the surface.
pub struct LayerLifecycleManager<S> {
    surface: Arc<S>,
    providers: ProviderSet,
    state: Mutex<ManagerState>,
}

impl<S> LayerLifecycleManager<S>
where
    S: RenderSurface + 'static,
{
    pub fn new(surface: Arc<S>, providers: ProviderSet, location: Location) -> Self {
        Self {
            surface,
            providers,
            state: Mutex::new(ManagerState {
                location,
                ..ManagerState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().expect("lifecycle state mutex poisoned")
    }

    /// Returns `true` when the flag actually changed.
    pub fn activate(&self, layer: LayerId) -> bool {
        let mut state = self.lock();
        let was_active = state.activation.set(layer, true);
        if !was_active {
            tracing::info!(%layer, "layer activated");
        }
        !was_active
    }

    /// Clears the layer's payload and, if it is visible or loading, the
    /// surface as well.
    pub fn deactivate(&self, layer: LayerId) -> bool {
        let mut state = self.lock();
        let was_active = state.activation.set(layer, false);
        state.payloads.clear(layer);
        if state.visible == Some(layer) || state.requested == Some(layer) {
            state.clear_visible(self.surface.as_ref());
        }
        if was_active {
            tracing::info!(%layer, "layer deactivated");
        }
        was_active
    }

    /// Mirrors the layer control: switching on also selects and shows the
    /// layer. Returns the new activation flag.
    pub async fn toggle(&self, layer: LayerId) -> Result<bool, LifecycleError> {
        let active = self.lock().activation.is_active(layer);
        if active {
            self.deactivate(layer);
            return Ok(false);
        }

        self.activate(layer);
        self.select_panel(layer).await?;
        Ok(true)
    }

    pub async fn set_visible(&self, layer: Option<LayerId>) -> Result<VisibleOutcome, LifecycleError> {
        let ticket = {
            let mut state = self.lock();
            match layer {
                None => {
                    if state.visible.is_none() && state.requested.is_none() && state.handles.is_empty() {
                        return Ok(VisibleOutcome::Unchanged);
                    }
                    state.clear_visible(self.surface.as_ref());
                    return Ok(VisibleOutcome::Cleared);
                }
                Some(layer) => {
                    if !state.activation.is_active(layer) {
                        return Err(LifecycleError::Inactive(layer));
                    }
                    if state.visible == Some(layer) || state.requested == Some(layer) {
                        return Ok(VisibleOutcome::Unchanged);
                    }
                    state.begin_load(self.surface.as_ref(), layer)
                }
            }
        };

        self.run_load(ticket).await
    }

    /// Replaces the location. Payloads of active layers are invalidated; the
    /// visible (or loading) layer is fetched again at the new location.
    pub async fn on_location_change(
        &self,
        location: Location,
    ) -> Result<Option<VisibleOutcome>, LifecycleError> {
        let ticket = {
            let mut state = self.lock();
            state.location = location;
            let active: Vec<LayerId> = state.activation.active_layers().collect();
            for layer in active {
                state.payloads.clear(layer);
            }
            tracing::info!(
                lat = location.lat,
                lng = location.lng,
                origin = location.origin.label(),
                "location changed"
            );

            match state.visible.or(state.requested) {
                Some(layer) => state.begin_load(self.surface.as_ref(), layer),
                None => return Ok(None),
            }
        };

        self.run_load(ticket).await.map(Some)
    }

    /// Records the selected detail panel; an active layer is also made visible.
    pub async fn select_panel(&self, layer: LayerId) -> Result<Option<VisibleOutcome>, LifecycleError> {
        let active = {
            let mut state = self.lock();
            state.selected_panel = Some(layer);
            state.activation.is_active(layer)
        };
        if !active {
            return Ok(None);
        }
        self.set_visible(Some(layer)).await.map(Some)
    }

    async fn run_load(&self, ticket: LoadTicket) -> Result<VisibleOutcome, LifecycleError> {
        let LoadTicket {
            layer,
            generation,
            location,
        } = ticket;

        let provider = match self.providers.get(layer) {
            Ok(provider) => provider,
            Err(err) => return Err(self.fail_load(ticket, err)),
        };

        tracing::debug!(%layer, generation, "loading layer");
        let result = provider.load(location).await;

        let mut state = self.lock();
        if state.generation != generation {
            tracing::debug!(
                %layer,
                generation,
                current = state.generation,
                "discarding stale layer result"
            );
            return Ok(VisibleOutcome::Discarded { layer });
        }
        state.requested = None;

        match result {
            Ok(data) => Ok(self.attach(&mut state, layer, data)),
            Err(err) => {
                drop(state);
                Err(self.fail_load(ticket, err))
            }
        }
    }

    fn attach(&self, state: &mut ManagerState, layer: LayerId, data: LayerData) -> VisibleOutcome {
        let LayerData {
            primitives,
            payload,
            notice,
        } = data;

        state.teardown(self.surface.as_ref());
        let handle = LayerRenderHandle::attach_all(self.surface.as_ref(), layer, primitives);
        let count = handle.len();
        state.handles.insert(layer, handle);
        state.payloads.replace(payload);
        state.visible = Some(layer);
        if let Some(message) = notice {
            state.notifications.push(Severity::Success, message);
        }

        tracing::info!(%layer, primitives = count, "layer attached");
        VisibleOutcome::Attached {
            layer,
            primitives: count,
        }
    }

    /// Provider failures are reported to the viewer and leave nothing visible.
    fn fail_load(&self, ticket: LoadTicket, err: ProviderError) -> LifecycleError {
        let mut state = self.lock();
        if state.generation == ticket.generation {
            state.requested = None;
            state.visible = None;
        }
        tracing::warn!(layer = %ticket.layer, error = %err, "layer load failed");
        state.notifications.push(
            Severity::Error,
            format!("Failed to load {}: {err}", ticket.layer.label()),
        );
        LifecycleError::Provider(err)
    }

    pub fn snapshot(&self) -> LifecycleSnapshot {
        let state = self.lock();
        LifecycleSnapshot {
            active: state.activation.active_layers().collect(),
            visible: state.visible,
            loading: state.requested,
            selected_panel: state.selected_panel,
            location: state.location,
            generation: state.generation,
            attached_primitives: state.handles.values().map(LayerRenderHandle::len).sum(),
            notifications: state.notifications.clone(),
        }
    }

    pub fn activation(&self) -> LayerActivationState {
        self.lock().activation.clone()
    }

    pub fn payloads(&self) -> PayloadStore {
        self.lock().payloads.clone()
    }

    pub fn location(&self) -> Location {
        self.lock().location
    }

    pub fn visible(&self) -> Option<LayerId> {
        self.lock().visible
    }

    /// Raises a notification on behalf of a collaborator (search, insights).
    pub fn notify(&self, severity: Severity, message: impl Into<String>) {
        self.lock().notifications.push(severity, message);
    }
}
