use anyhow::Context;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::crop::{remap_keypoints, CropRegion, RegionTracker};
use super::detector::PoseModel;
use super::keypoint::FrameKeypoints;
use super::preprocess::crop_and_resize;
use crate::config::TrackingConfig;
use crate::error::PipelineError;
use crate::video::Frame;

/// Runs the pose model over a clip, frame by frame.
///
/// Frame N is cropped with the region derived from frame N-1's keypoints, so
/// frames are processed strictly in order. The model handle is owned here for
/// the lifetime of the extractor.
pub struct KeypointExtractor<M> {
    model: M,
    tracker: RegionTracker,
    adaptive: bool,
    timeout: Option<Duration>,
}

impl<M: PoseModel> KeypointExtractor<M> {
    pub fn new(model: M, tracking: &TrackingConfig) -> Self {
        Self {
            model,
            tracker: RegionTracker::from_config(tracking),
            adaptive: tracking.adaptive,
            timeout: None,
        }
    }

    /// Abort `extract` with [`PipelineError::TimedOut`] once `limit` has elapsed.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Releases the model handle.
    pub fn into_model(self) -> M {
        self.model
    }

    /// One [`FrameKeypoints`] per input frame, in full-frame coordinates.
    ///
    /// All-zero-confidence model output is passed through unchanged.
    pub fn extract(&mut self, frames: &[Frame]) -> Result<Vec<FrameKeypoints>, PipelineError> {
        if frames.is_empty() {
            return Err(PipelineError::NoUsableInput("no frames to analyse".into()));
        }

        let started = Instant::now();
        let input_size = self.model.input_size();
        let mut all_keypoints: Vec<FrameKeypoints> = Vec::with_capacity(frames.len());
        let mut tracked = 0usize;

        for (index, frame) in frames.iter().enumerate() {
            self.check_deadline(started, index)?;

            let (height, width, _) = frame.dim();
            let previous = if self.adaptive { all_keypoints.last() } else { None };
            let region = self.tracker.next_region(previous, height, width);
            if region != CropRegion::full_frame(height, width) {
                tracked += 1;
            }

            let input = crop_and_resize(frame.view(), &region, input_size);
            let local = self
                .model
                .detect(input)
                .with_context(|| format!("pose inference failed on frame {}", index))?;
            if local.is_degenerate() {
                debug!(frame = index, "pose model returned zero confidence for every keypoint");
            }

            all_keypoints.push(remap_keypoints(&local, &region));
        }
        // the last inference can still overrun
        self.check_deadline(started, frames.len() - 1)?;

        info!(
            frames = all_keypoints.len(),
            tracked,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "keypoint extraction finished"
        );
        Ok(all_keypoints)
    }

    fn check_deadline(&self, started: Instant, frame: usize) -> Result<(), PipelineError> {
        match self.timeout {
            Some(limit) if started.elapsed() >= limit => Err(PipelineError::TimedOut {
                frame,
                elapsed: started.elapsed(),
                limit,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pose::keypoint::{Keypoint, KeypointIndex};
    use anyhow::Result;
    use ndarray::{Array3, Array4};

    /// Returns scripted crop-local keypoints, cycling through `script`.
    pub(crate) struct ScriptedModel {
        pub script: Vec<FrameKeypoints>,
        pub calls: usize,
        pub inputs: Vec<Array4<f32>>,
    }

    impl ScriptedModel {
        pub fn new(script: Vec<FrameKeypoints>) -> Self {
            Self {
                script,
                calls: 0,
                inputs: Vec::new(),
            }
        }
    }

    impl PoseModel for ScriptedModel {
        fn input_size(&self) -> usize {
            8
        }

        fn detect(&mut self, input: Array4<f32>) -> Result<FrameKeypoints> {
            let out = self.script[self.calls % self.script.len()].clone();
            self.calls += 1;
            self.inputs.push(input);
            Ok(out)
        }
    }

    struct FailingModel;

    impl PoseModel for FailingModel {
        fn input_size(&self) -> usize {
            8
        }

        fn detect(&mut self, _input: Array4<f32>) -> Result<FrameKeypoints> {
            anyhow::bail!("session closed")
        }
    }

    /// Sleeps through every inference.
    struct SlowModel(Duration);

    impl PoseModel for SlowModel {
        fn input_size(&self) -> usize {
            8
        }

        fn detect(&mut self, _input: Array4<f32>) -> Result<FrameKeypoints> {
            std::thread::sleep(self.0);
            Ok(FrameKeypoints::default())
        }
    }

    fn torso_frame(confidence: f32) -> FrameKeypoints {
        let mut keypoints = [Keypoint::new(0.5, 0.5, 0.0); KeypointIndex::COUNT];
        keypoints[KeypointIndex::LeftHip as usize] = Keypoint::new(0.5, 0.5, confidence);
        keypoints[KeypointIndex::RightHip as usize] = Keypoint::new(0.5, 0.5, confidence);
        keypoints[KeypointIndex::LeftShoulder as usize] = Keypoint::new(0.5, 0.4, confidence);
        keypoints[KeypointIndex::RightShoulder as usize] = Keypoint::new(0.5, 0.4, confidence);
        FrameKeypoints::new(keypoints)
    }

    fn frames(n: usize) -> Vec<Frame> {
        (0..n).map(|_| Array3::<u8>::from_elem((64, 64, 3), 100)).collect()
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let mut extractor =
            KeypointExtractor::new(ScriptedModel::new(vec![torso_frame(0.9)]), &TrackingConfig::default());
        let err = extractor.extract(&[]).unwrap_err();
        assert!(matches!(err, PipelineError::NoUsableInput(_)));
    }

    #[test]
    fn test_one_output_per_frame_in_order() {
        let mut extractor =
            KeypointExtractor::new(ScriptedModel::new(vec![torso_frame(0.1)]), &TrackingConfig::default());
        let result = extractor.extract(&frames(5)).unwrap();
        assert_eq!(result.len(), 5);
        assert_eq!(extractor.model().calls, 5);
        assert_eq!(extractor.model().inputs[0].shape(), &[1, 8, 8, 3]);
    }

    #[test]
    fn test_first_frame_uses_full_frame_region() {
        let mut extractor =
            KeypointExtractor::new(ScriptedModel::new(vec![torso_frame(0.9)]), &TrackingConfig::default());
        let result = extractor.extract(&frames(1)).unwrap();
        // square frame: the default region is the identity
        assert_eq!(result[0], torso_frame(0.9));
    }

    #[test]
    fn test_second_frame_follows_previous_keypoints() {
        let mut extractor =
            KeypointExtractor::new(ScriptedModel::new(vec![torso_frame(0.9)]), &TrackingConfig::default());
        let result = extractor.extract(&frames(2)).unwrap();

        let region = RegionTracker::new().next_region(Some(&result[0]), 64, 64);
        assert!(region.height < 1.0);
        let expected = remap_keypoints(&torso_frame(0.9), &region);
        assert_eq!(result[1], expected);
    }

    #[test]
    fn test_low_confidence_keeps_full_frame() {
        let mut extractor =
            KeypointExtractor::new(ScriptedModel::new(vec![torso_frame(0.3)]), &TrackingConfig::default());
        let result = extractor.extract(&frames(3)).unwrap();
        assert!(result.iter().all(|kp| *kp == torso_frame(0.3)));
    }

    #[test]
    fn test_non_adaptive_mode_never_tracks() {
        let tracking = TrackingConfig {
            adaptive: false,
            ..TrackingConfig::default()
        };
        let mut extractor = KeypointExtractor::new(ScriptedModel::new(vec![torso_frame(0.9)]), &tracking);
        let result = extractor.extract(&frames(3)).unwrap();
        assert!(result.iter().all(|kp| *kp == torso_frame(0.9)));
    }

    #[test]
    fn test_degenerate_output_is_propagated() {
        let mut extractor = KeypointExtractor::new(
            ScriptedModel::new(vec![FrameKeypoints::default()]),
            &TrackingConfig::default(),
        );
        let result = extractor.extract(&frames(2)).unwrap();
        assert!(result.iter().all(|kp| kp.is_degenerate()));
    }

    #[test]
    fn test_zero_timeout_times_out() {
        let mut extractor =
            KeypointExtractor::new(ScriptedModel::new(vec![torso_frame(0.9)]), &TrackingConfig::default())
                .with_timeout(Duration::ZERO);
        let err = extractor.extract(&frames(2)).unwrap_err();
        assert!(matches!(err, PipelineError::TimedOut { frame: 0, .. }));
    }

    #[test]
    fn test_overrun_on_last_frame_times_out() {
        let mut extractor =
            KeypointExtractor::new(SlowModel(Duration::from_millis(50)), &TrackingConfig::default())
                .with_timeout(Duration::from_millis(10));
        let err = extractor.extract(&frames(1)).unwrap_err();
        assert!(matches!(err, PipelineError::TimedOut { frame: 0, .. }));
    }

    #[test]
    fn test_model_failure_names_frame() {
        let mut extractor = KeypointExtractor::new(FailingModel, &TrackingConfig::default());
        let err = extractor.extract(&frames(1)).unwrap_err();
        assert!(matches!(err, PipelineError::Model(_)));
        assert_eq!(err.to_string(), "pose inference failed on frame 0");
    }
}
