#[cfg(feature = "desktop")]
pub mod capture;

#[cfg(feature = "desktop")]
pub use capture::VideoSource;

use ndarray::Array3;

use crate::config::VideoConfig;

/// Decoded RGB frame, shape (height, width, 3).
pub type Frame = Array3<u8>;

/// Frame rate assumed when the container reports none.
const FALLBACK_FPS: f64 = 30.0;

/// Which source frames are decoded from a clip.
///
/// Bounds the work done per clip: at most `max_duration_secs` of video,
/// decimated to at most `max_fps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    /// First source frame to decode
    pub start: usize,
    /// Keep every `stride`-th source frame
    pub stride: usize,
    /// Number of frames to keep
    pub count: usize,
}

impl FramePlan {
    /// `total_frames == 0` means the container did not report a length.
    pub fn new(total_frames: usize, fps: f64, config: &VideoConfig) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { FALLBACK_FPS };
        let max_window = (fps * config.max_duration_secs.max(0.0)).round() as usize;
        let window = if total_frames == 0 {
            max_window
        } else {
            total_frames.min(max_window)
        };

        let stride = if config.max_fps > 0.0 && fps > config.max_fps {
            (fps / config.max_fps).ceil() as usize
        } else {
            1
        };

        let start = if config.centered_window && total_frames > window {
            (total_frames - window) / 2
        } else {
            0
        };

        Self {
            start,
            stride,
            count: window.div_ceil(stride),
        }
    }

    /// Whether the source frame `offset` frames after `start` is kept.
    pub fn keeps(&self, offset: usize) -> bool {
        offset % self.stride == 0 && offset / self.stride < self.count
    }

    /// Source frames spanned by the plan.
    pub fn window(&self) -> usize {
        if self.count == 0 {
            0
        } else {
            (self.count - 1) * self.stride + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(centered: bool) -> VideoConfig {
        VideoConfig {
            centered_window: centered,
            ..VideoConfig::default()
        }
    }

    #[test]
    fn test_short_clip_is_read_whole() {
        let plan = FramePlan::new(120, 30.0, &config(true));
        assert_eq!(plan, FramePlan { start: 0, stride: 1, count: 120 });
    }

    #[test]
    fn test_long_clip_capped_to_duration() {
        // 30fps x 10s = 300
        let plan = FramePlan::new(900, 30.0, &config(false));
        assert_eq!(plan, FramePlan { start: 0, stride: 1, count: 300 });
    }

    #[test]
    fn test_long_clip_centered_window() {
        let plan = FramePlan::new(900, 30.0, &config(true));
        assert_eq!(plan.start, 300);
        assert_eq!(plan.count, 300);
    }

    #[test]
    fn test_high_frame_rate_is_decimated() {
        let plan = FramePlan::new(1200, 60.0, &config(false));
        assert_eq!(plan.stride, 2);
        assert_eq!(plan.count, 300);
        assert_eq!(plan.window(), 599);
        assert!(plan.keeps(0));
        assert!(!plan.keeps(1));
        assert!(plan.keeps(598));
        assert!(!plan.keeps(600));
    }

    #[test]
    fn test_unknown_length_and_fps() {
        let plan = FramePlan::new(0, f64::NAN, &config(true));
        assert_eq!(plan, FramePlan { start: 0, stride: 1, count: 300 });
    }

    #[test]
    fn test_empty_clip() {
        let plan = FramePlan::new(0, 30.0, &VideoConfig {
            max_duration_secs: 0.0,
            ..VideoConfig::default()
        });
        assert_eq!(plan.count, 0);
        assert_eq!(plan.window(), 0);
        assert!(!plan.keeps(0));
    }
}
