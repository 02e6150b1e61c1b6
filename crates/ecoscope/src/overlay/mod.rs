//! Sustainability overlays: providers, lifecycle, scoring and insights.

pub mod insights;
pub mod layers;
pub mod lifecycle;
pub mod providers;
pub mod roof;
pub mod router;
pub mod scoring;
pub mod session;

pub use layers::{LayerActivationState, LayerId, UnknownLayer};
pub use lifecycle::{LayerLifecycleManager, LifecycleError, VisibleOutcome};
pub use router::session_router;
pub use scoring::{CompositeScore, CompositeScoringEngine, Grade, ScoreReport};
pub use session::{AnalysisSession, SessionError, SessionState};
