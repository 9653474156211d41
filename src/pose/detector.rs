use anyhow::Result;
use ndarray::Array4;

use super::keypoint::FrameKeypoints;

/// Single-person 2D pose estimator.
///
/// Input is a `[1, size, size, 3]` RGB tensor (0.0-255.0) with
/// `size == input_size()`. Output keypoints are normalized to that square.
pub trait PoseModel {
    fn input_size(&self) -> usize;

    fn detect(&mut self, input: Array4<f32>) -> Result<FrameKeypoints>;
}

impl<M: PoseModel + ?Sized> PoseModel for Box<M> {
    fn input_size(&self) -> usize {
        (**self).input_size()
    }

    fn detect(&mut self, input: Array4<f32>) -> Result<FrameKeypoints> {
        (**self).detect(input)
    }
}

#[cfg(feature = "desktop")]
pub use movenet::MoveNet;

#[cfg(feature = "desktop")]
mod movenet {
    use anyhow::{bail, Context, Result};
    use ndarray::Array4;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::Tensor;
    use std::path::Path;

    use super::PoseModel;
    use crate::config::ModelConfig;
    use crate::pose::keypoint::{FrameKeypoints, KeypointIndex};

    /// MoveNet singlepose running on an ONNX Runtime session.
    pub struct MoveNet {
        session: Session,
        input_size: usize,
        input_name: String,
        output_name: String,
    }

    impl MoveNet {
        pub fn new<P: AsRef<Path>>(
            model_path: P,
            input_size: usize,
            input_name: &str,
            output_name: &str,
        ) -> Result<Self> {
            let session = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .commit_from_file(model_path.as_ref())
                .with_context(|| {
                    format!("Failed to load ONNX model {}", model_path.as_ref().display())
                })?;

            Ok(Self {
                session,
                input_size,
                input_name: input_name.to_string(),
                output_name: output_name.to_string(),
            })
        }

        pub fn from_config(config: &ModelConfig) -> Result<Self> {
            Self::new(
                &config.path,
                config.input_size,
                &config.input_name,
                &config.output_name,
            )
        }
    }

    impl PoseModel for MoveNet {
        fn input_size(&self) -> usize {
            self.input_size
        }

        fn detect(&mut self, input: Array4<f32>) -> Result<FrameKeypoints> {
            let input_tensor = Tensor::from_array(input)?;
            let outputs = self
                .session
                .run(ort::inputs![self.input_name.as_str() => input_tensor])
                .context("Inference failed")?;

            // [1, 1, 17, 3] of (y, x, score)
            let output: ndarray::ArrayViewD<f32> = outputs[self.output_name.as_str()]
                .try_extract_array()
                .context("Failed to extract output tensor")?;
            if output.shape() != [1, 1, KeypointIndex::COUNT, 3] {
                bail!("Unexpected MoveNet output shape {:?}", output.shape());
            }

            let mut rows = [[0.0f32; 3]; KeypointIndex::COUNT];
            for (i, row) in rows.iter_mut().enumerate() {
                *row = [output[[0, 0, i, 0]], output[[0, 0, i, 1]], output[[0, 0, i, 2]]];
            }

            Ok(FrameKeypoints::from_yx_scores(&rows))
        }
    }
}
