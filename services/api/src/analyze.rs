use crate::infra::{build_session, SceneGraph};
use clap::Args;
use ecoscope::config::AppConfig;
use ecoscope::error::AppError;
use ecoscope::geo::{Location, LocationOrigin};
use ecoscope::overlay::insights::InsightsStatus;
use ecoscope::overlay::scoring::LayerStatus;
use ecoscope::overlay::{AnalysisSession, LayerId, ScoreReport};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) lat: f64,
    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) lng: f64,
    /// Layers to load (repeatable). Defaults to all five.
    #[arg(long = "layer", value_parser = parse_layer)]
    pub(crate) layers: Vec<LayerId>,
    /// Wait for the narrative insights once every layer is active.
    #[arg(long)]
    pub(crate) insights: bool,
}

fn parse_layer(raw: &str) -> Result<LayerId, String> {
    raw.parse::<LayerId>().map_err(|err| err.to_string())
}

pub(crate) async fn run_analysis(args: AnalyzeArgs) -> Result<(), AppError> {
    let AnalyzeArgs {
        lat,
        lng,
        layers,
        insights,
    } = args;

    let config = AppConfig::load()?;
    let scene = Arc::new(SceneGraph::default());
    let session = build_session(&config, scene.clone());
    let location = Location::new(lat, lng, Location::DEFAULT_ALTITUDE, LocationOrigin::Map);
    session.change_location(location).await?;

    let layers = if layers.is_empty() {
        LayerId::ordered().to_vec()
    } else {
        layers
    };

    println!("Sustainability overlay for ({lat:.5}, {lng:.5})");
    for layer in layers {
        match session.toggle(layer).await {
            Ok(_) => println!(
                "- {}: loaded ({} primitives on the surface)",
                layer.label(),
                scene.len()
            ),
            Err(err) => println!("- {}: unavailable ({err})", layer.label()),
        }
    }

    render_notifications(&session);
    render_score(&session.score());

    if insights {
        let view = session.insights_settled().await;
        match (view.status, view.markdown) {
            (InsightsStatus::Ready, Some(markdown)) => println!("\nInsights\n{markdown}"),
            (InsightsStatus::Idle, _) => {
                println!("\nInsights are requested only once all five layers are active.")
            }
            _ => println!("\nInsights unavailable."),
        }
    }

    Ok(())
}

fn render_notifications(session: &AnalysisSession<SceneGraph>) {
    let state = session.state();
    if state.lifecycle.notifications.is_empty() {
        return;
    }
    println!("\nNotifications");
    for notice in state.lifecycle.notifications.iter() {
        println!(
            "  [{}] {:?}: {}",
            notice.raised_at.format("%H:%M:%S"),
            notice.severity,
            notice.message
        );
    }
}

fn render_score(report: &ScoreReport) {
    println!(
        "\nComposite score: {}/100 (grade {})",
        report.composite.total, report.composite.grade
    );
    for entry in &report.breakdown {
        match entry.status {
            LayerStatus::Disabled => println!("  - {}: disabled", entry.label),
            LayerStatus::Loading => println!("  - {}: no data", entry.label),
            LayerStatus::Scored {
                rounded,
                max,
                contribution_pct,
                ..
            } => {
                println!(
                    "  - {}: {rounded}/{max} ({contribution_pct}%)",
                    entry.label
                );
                for component in &entry.components {
                    println!(
                        "      {}: {:.1}/{:.0} {}",
                        component.name, component.score, component.max, component.notes
                    );
                }
            }
        }
    }
}
