use crate::infra::{AppState, SceneGraph, SceneNode};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use ecoscope::overlay::{session_router, AnalysisSession};
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct SurfaceResponse {
    pub(crate) count: usize,
    pub(crate) primitives: Vec<SceneNode>,
}

pub(crate) fn with_session_routes(session: Arc<AnalysisSession<SceneGraph>>) -> Router {
    session_router(session)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/session/surface", get(surface_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Everything currently attached to the surface, for clients that draw it.
pub(crate) async fn surface_endpoint(Extension(state): Extension<AppState>) -> Json<SurfaceResponse> {
    let primitives = state.scene.nodes();
    Json(SurfaceResponse {
        count: primitives.len(),
        primitives,
    })
}
