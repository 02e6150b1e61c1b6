use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::insights::InsightsView;
use super::layers::LayerId;
use super::scoring::ScoreReport;
use super::session::{AnalysisSession, SessionState};
use crate::error::AppError;
use crate::geo::{Location, LocationOrigin};
use crate::render::RenderSurface;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRequest {
    pub lat: f64,
    pub lng: f64,
    pub altitude: Option<f64>,
    pub origin: Option<LocationOrigin>,
}

impl From<LocationRequest> for Location {
    fn from(value: LocationRequest) -> Self {
        Location::new(
            value.lat,
            value.lng,
            value.altitude.unwrap_or(Location::DEFAULT_ALTITUDE),
            value.origin.unwrap_or(LocationOrigin::Map),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub place_id: String,
}

#[derive(Debug, Deserialize)]
pub struct VisibleRequest {
    pub layer: Option<LayerId>,
}

/// HTTP surface over the single analysis session.
pub fn session_router<S>(session: Arc<AnalysisSession<S>>) -> Router
where
    S: RenderSurface + 'static,
{
    Router::new()
        .route("/api/v1/session", get(state_handler::<S>))
        .route("/api/v1/session/location", post(location_handler::<S>))
        .route("/api/v1/session/search", post(search_handler::<S>))
        .route(
            "/api/v1/session/layers/:layer/toggle",
            post(toggle_handler::<S>),
        )
        .route(
            "/api/v1/session/layers/:layer/activate",
            post(activate_handler::<S>),
        )
        .route(
            "/api/v1/session/layers/:layer/deactivate",
            post(deactivate_handler::<S>),
        )
        .route(
            "/api/v1/session/layers/:layer/select",
            post(select_handler::<S>),
        )
        .route("/api/v1/session/visible", put(visible_handler::<S>))
        .route("/api/v1/session/score", get(score_handler::<S>))
        .route("/api/v1/session/insights", get(insights_handler::<S>))
        .with_state(session)
}

fn parse_layer(raw: &str) -> Result<LayerId, AppError> {
    raw.parse::<LayerId>().map_err(AppError::from)
}

async fn state_handler<S>(State(session): State<Arc<AnalysisSession<S>>>) -> Json<SessionState>
where
    S: RenderSurface + 'static,
{
    Json(session.state())
}

async fn location_handler<S>(
    State(session): State<Arc<AnalysisSession<S>>>,
    Json(request): Json<LocationRequest>,
) -> Result<Json<Value>, AppError>
where
    S: RenderSurface + 'static,
{
    let location = Location::from(request);
    let outcome = session.change_location(location).await?;
    Ok(Json(json!({ "location": location, "reload": outcome })))
}

async fn search_handler<S>(
    State(session): State<Arc<AnalysisSession<S>>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Location>, AppError>
where
    S: RenderSurface + 'static,
{
    let location = session.search_place(&request.place_id).await?;
    Ok(Json(location))
}

async fn toggle_handler<S>(
    State(session): State<Arc<AnalysisSession<S>>>,
    Path(layer): Path<String>,
) -> Result<Json<SessionState>, AppError>
where
    S: RenderSurface + 'static,
{
    let layer = parse_layer(&layer)?;
    session.toggle(layer).await?;
    Ok(Json(session.state()))
}

async fn activate_handler<S>(
    State(session): State<Arc<AnalysisSession<S>>>,
    Path(layer): Path<String>,
) -> Result<Json<SessionState>, AppError>
where
    S: RenderSurface + 'static,
{
    session.activate(parse_layer(&layer)?);
    Ok(Json(session.state()))
}

async fn deactivate_handler<S>(
    State(session): State<Arc<AnalysisSession<S>>>,
    Path(layer): Path<String>,
) -> Result<Json<SessionState>, AppError>
where
    S: RenderSurface + 'static,
{
    session.deactivate(parse_layer(&layer)?);
    Ok(Json(session.state()))
}

async fn select_handler<S>(
    State(session): State<Arc<AnalysisSession<S>>>,
    Path(layer): Path<String>,
) -> Result<Json<SessionState>, AppError>
where
    S: RenderSurface + 'static,
{
    session.select_panel(parse_layer(&layer)?).await?;
    Ok(Json(session.state()))
}

async fn visible_handler<S>(
    State(session): State<Arc<AnalysisSession<S>>>,
    Json(request): Json<VisibleRequest>,
) -> Result<Json<Value>, AppError>
where
    S: RenderSurface + 'static,
{
    let outcome = session.set_visible(request.layer).await?;
    Ok(Json(json!({ "result": outcome, "visible": session.manager().visible() })))
}

async fn score_handler<S>(State(session): State<Arc<AnalysisSession<S>>>) -> Json<ScoreReport>
where
    S: RenderSurface + 'static,
{
    Json(session.score())
}

async fn insights_handler<S>(State(session): State<Arc<AnalysisSession<S>>>) -> Json<InsightsView>
where
    S: RenderSurface + 'static,
{
    Json(session.insights())
}
