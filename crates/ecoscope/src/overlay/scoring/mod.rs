//! Composite sustainability score. Everything here is a pure function of the
//! activation flags and the stored payloads, recomputed on every read.

mod grade;
mod rules;

pub use grade::Grade;

use serde::Serialize;

use crate::overlay::layers::{LayerActivationState, LayerId};
use crate::overlay::providers::PayloadStore;

pub const fn max_score(layer: LayerId) -> f64 {
    match layer {
        LayerId::Walkability => 30.0,
        LayerId::AirQuality => 20.0,
        LayerId::Solar => 40.0,
        LayerId::GreenSpaces => 30.0,
        LayerId::Transit => 30.0,
    }
}

/// Stateless scorer over the session's current metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeScoringEngine;

impl CompositeScoringEngine {
    pub fn evaluate(
        &self,
        activation: &LayerActivationState,
        payloads: &PayloadStore,
    ) -> ScoreReport {
        let breakdown: Vec<ScoreBreakdown> = LayerId::ordered()
            .into_iter()
            .map(|layer| ScoreBreakdown::for_layer(layer, activation, payloads))
            .collect();

        let composite = CompositeScore::from_breakdown(&breakdown);
        tracing::debug!(total = composite.total, grade = %composite.grade, "composite score evaluated");

        ScoreReport {
            composite,
            grade_color: composite.grade.color(),
            breakdown,
        }
    }
}

/// Discrete contribution inside one layer's sub-score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    pub name: &'static str,
    pub score: f64,
    pub max: f64,
    pub notes: String,
}

impl ScoreComponent {
    fn new(name: &'static str, score: f64, max: f64, notes: String) -> Self {
        Self {
            name,
            score,
            max,
            notes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTone {
    Success,
    Warning,
    Error,
}

impl ScoreTone {
    pub fn from_contribution(percent: u32) -> Self {
        if percent >= 80 {
            Self::Success
        } else if percent >= 60 {
            Self::Warning
        } else {
            Self::Error
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LayerStatus {
    Disabled,
    Loading,
    #[serde(rename_all = "camelCase")]
    Scored {
        rounded: u32,
        max: u32,
        contribution_pct: u32,
        tone: ScoreTone,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub layer: LayerId,
    pub label: &'static str,
    pub raw_score: f64,
    pub max_score: f64,
    pub active: bool,
    pub has_data: bool,
    pub status: LayerStatus,
    pub components: Vec<ScoreComponent>,
}

impl ScoreBreakdown {
    fn for_layer(layer: LayerId, activation: &LayerActivationState, payloads: &PayloadStore) -> Self {
        let active = activation.is_active(layer);
        let max = max_score(layer);
        let scored = payloads.get(layer).map(rules::score_payload);
        let has_data = scored.is_some();
        let (raw_score, components) = scored.unwrap_or_default();

        let status = match (active, has_data) {
            (false, _) => LayerStatus::Disabled,
            (true, false) => LayerStatus::Loading,
            (true, true) => {
                let rounded = raw_score.round().max(0.0) as u32;
                let contribution_pct = (f64::from(rounded) / max * 100.0).round() as u32;
                LayerStatus::Scored {
                    rounded,
                    max: max as u32,
                    contribution_pct,
                    tone: ScoreTone::from_contribution(contribution_pct),
                }
            }
        };

        Self {
            layer,
            label: layer.label(),
            raw_score,
            max_score: max,
            active,
            has_data,
            status,
            components,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompositeScore {
    pub total: u8,
    pub grade: Grade,
}

impl CompositeScore {
    /// Active layers that are still loading count toward the denominator only.
    pub fn from_breakdown(breakdown: &[ScoreBreakdown]) -> Self {
        let (numerator, denominator) = breakdown
            .iter()
            .filter(|entry| entry.active)
            .fold((0.0, 0.0), |(num, den), entry| {
                let earned = if entry.has_data { entry.raw_score } else { 0.0 };
                (num + earned, den + entry.max_score)
            });

        let total = if denominator > 0.0 {
            (numerator / denominator * 100.0).round().clamp(0.0, 100.0) as u8
        } else {
            0
        };

        Self {
            total,
            grade: Grade::from_total(total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub composite: CompositeScore,
    pub grade_color: &'static str,
    pub breakdown: Vec<ScoreBreakdown>,
}

impl ScoreReport {
    pub fn layer(&self, layer: LayerId) -> Option<&ScoreBreakdown> {
        self.breakdown.iter().find(|entry| entry.layer == layer)
    }
}
