use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bikefit::analysis::{assess, FitAssessment, MeasurementSummary, Metric};
use bikefit::config::Config;
use bikefit::pipeline::Pipeline;
use bikefit::pose::MoveNet;
use bikefit::video::VideoSource;

const CONFIG_PATH: &str = "config.toml";

#[derive(Serialize)]
struct Report {
    metrics: BTreeMap<String, f64>,
    fit: BTreeMap<Metric, FitAssessment>,
    summary: MeasurementSummary,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bikefit=info,ort=warn")),
        )
        .init();
    info!("bikefit ({})", env!("BIKEFIT_BUILD"));

    let mut args = std::env::args().skip(1);
    let Some(video_path) = args.next() else {
        bail!("usage: bikefit <video> [config.toml]");
    };
    let config_path = args.next().unwrap_or_else(|| CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path);

    info!("Loading model from {}", config.model.path);
    let model = MoveNet::from_config(&config.model)?;

    let mut source = VideoSource::open(&video_path)?;
    let frames = source.read_frames(&config.video)?;

    let mut pipeline = Pipeline::new(model, &config);
    let summary = pipeline
        .run(&frames)
        .with_context(|| format!("Failed to analyse {}", video_path))?;

    let report = Report {
        metrics: summary.to_metric_map(),
        fit: assess(&summary, &config.fit),
        summary,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
