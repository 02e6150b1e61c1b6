//! Geospatial sustainability overlays for a 3D map: layer orchestration,
//! roof-plane projection and a composite score over five datasets.

pub mod config;
pub mod error;
pub mod geo;
pub mod overlay;
pub mod render;
pub mod telemetry;
