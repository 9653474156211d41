use std::path::Path;
use std::time::Duration;

/// Failures that end a run without producing a measurement summary.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Empty or unreadable input: no frames or no keypoints to measure.
    #[error("no usable input: {0}")]
    NoUsableInput(String),
    /// The frame extraction loop ran past its deadline.
    #[error("processing timed out at frame {frame} after {elapsed:?} (limit {limit:?})")]
    TimedOut {
        frame: usize,
        elapsed: Duration,
        limit: Duration,
    },
    /// The pose model failed on a frame.
    #[error(transparent)]
    Model(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn unreadable_video(path: &Path) -> Self {
        Self::NoUsableInput(format!("cannot open video {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = PipelineError::NoUsableInput("video contains no frames".into());
        assert_eq!(err.to_string(), "no usable input: video contains no frames");

        let err = PipelineError::TimedOut {
            frame: 12,
            elapsed: Duration::from_secs(3),
            limit: Duration::from_secs(2),
        };
        assert!(err.to_string().starts_with("processing timed out at frame 12"));
    }

    #[test]
    fn test_unreadable_video_is_no_usable_input() {
        let err = PipelineError::unreadable_video(Path::new("clips/missing.mp4"));
        assert!(matches!(err, PipelineError::NoUsableInput(_)));
        assert_eq!(err.to_string(), "no usable input: cannot open video clips/missing.mp4");
    }

    #[test]
    fn test_model_error_is_transparent() {
        let err: PipelineError = anyhow::anyhow!("Inference failed").into();
        assert_eq!(err.to_string(), "Inference failed");
    }
}
