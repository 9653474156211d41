use std::time::Duration;
use tracing::info;

use crate::analysis::{resolve, Aggregator, MeasurementSummary};
use crate::config::{AnalysisConfig, Config};
use crate::error::PipelineError;
use crate::pose::{FrameKeypoints, KeypointExtractor, PoseModel};
use crate::video::Frame;

/// Measures a keypoint sequence. Orientation is fixed from the first frame.
pub fn analyze_keypoints(
    frames: &[FrameKeypoints],
    config: &AnalysisConfig,
) -> Result<MeasurementSummary, PipelineError> {
    let first = frames
        .first()
        .ok_or_else(|| PipelineError::NoUsableInput("empty keypoint sequence".into()))?;
    let (orientation, anatomy) = resolve(first);
    info!(orientation = orientation.as_str(), frames = frames.len(), "analysing clip");

    Ok(Aggregator::from_config(config).aggregate(frames, &anatomy))
}

/// Frames → keypoints → [`MeasurementSummary`].
pub struct Pipeline<M> {
    extractor: KeypointExtractor<M>,
    analysis: AnalysisConfig,
}

impl<M: PoseModel> Pipeline<M> {
    pub fn new(model: M, config: &Config) -> Self {
        let mut extractor = KeypointExtractor::new(model, &config.tracking);
        if config.analysis.timeout_secs > 0 {
            extractor = extractor.with_timeout(Duration::from_secs(config.analysis.timeout_secs));
        }
        Self {
            extractor,
            analysis: config.analysis.clone(),
        }
    }

    pub fn run(&mut self, frames: &[Frame]) -> Result<MeasurementSummary, PipelineError> {
        let keypoints = self.extractor.extract(frames)?;
        analyze_keypoints(&keypoints, &self.analysis)
    }

    pub fn into_model(self) -> M {
        self.extractor.into_model()
    }
}
