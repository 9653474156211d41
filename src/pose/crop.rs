use tracing::debug;

use super::keypoint::{FrameKeypoints, Keypoint, KeypointIndex};
use crate::config::TrackingConfig;

/// Crop rectangle in normalized full-frame coordinates.
///
/// Square in pixel space. `y_min`/`x_min` may be negative and `y_max`/`x_max`
/// may exceed 1.0 when the frame is padded to a square; sampling outside the
/// frame yields black.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub y_min: f32,
    pub x_min: f32,
    pub y_max: f32,
    pub x_max: f32,
    pub height: f32,
    pub width: f32,
}

impl CropRegion {
    pub fn new(y_min: f32, x_min: f32, height: f32, width: f32) -> Self {
        Self {
            y_min,
            x_min,
            y_max: y_min + height,
            x_max: x_min + width,
            height,
            width,
        }
    }

    /// Full frame padded to a square by centering the shorter side.
    pub fn full_frame(frame_height: usize, frame_width: usize) -> Self {
        let h = frame_height as f32;
        let w = frame_width as f32;
        if frame_width > frame_height {
            Self::new((h / 2.0 - w / 2.0) / h, 0.0, w / h, 1.0)
        } else {
            Self::new(0.0, (w / 2.0 - h / 2.0) / w, 1.0, h / w)
        }
    }
}

/// Chooses the crop for the next frame from the previous frame's keypoints.
///
/// The crop is a square centered on the hip midpoint, sized from the spread of
/// the torso and of every confident joint. Low torso confidence or an
/// implausibly large body falls back to [`CropRegion::full_frame`].
#[derive(Debug, Clone)]
pub struct RegionTracker {
    /// Keypoints at or below this score are ignored
    min_keypoint_score: f32,
    torso_expansion: f32,
    body_expansion: f32,
}

impl RegionTracker {
    pub fn new() -> Self {
        Self::from_config(&TrackingConfig::default())
    }

    pub fn from_config(config: &TrackingConfig) -> Self {
        Self {
            min_keypoint_score: config.min_keypoint_score,
            torso_expansion: config.torso_expansion,
            body_expansion: config.body_expansion,
        }
    }

    /// Either hip and either shoulder above the score threshold.
    pub fn torso_visible(&self, keypoints: &FrameKeypoints) -> bool {
        let confident = |idx| keypoints.get(idx).is_confident(self.min_keypoint_score);
        (confident(KeypointIndex::LeftHip) || confident(KeypointIndex::RightHip))
            && (confident(KeypointIndex::LeftShoulder) || confident(KeypointIndex::RightShoulder))
    }

    pub fn next_region(
        &self,
        previous: Option<&FrameKeypoints>,
        frame_height: usize,
        frame_width: usize,
    ) -> CropRegion {
        let default_region = CropRegion::full_frame(frame_height, frame_width);
        let keypoints = match previous {
            Some(kp) => kp,
            None => return default_region,
        };

        if !self.torso_visible(keypoints) {
            debug!("torso not visible, using full-frame crop");
            return default_region;
        }

        let h = frame_height as f32;
        let w = frame_width as f32;
        let (ly, lx) = keypoints.get(KeypointIndex::LeftHip).to_pixel(frame_height, frame_width);
        let (ry, rx) = keypoints.get(KeypointIndex::RightHip).to_pixel(frame_height, frame_width);
        let center_y = (ly + ry) / 2.0;
        let center_x = (lx + rx) / 2.0;

        let range = self.ranges(keypoints, center_y, center_x, frame_height, frame_width);
        let mut half = (range.torso_x * self.torso_expansion)
            .max(range.torso_y * self.torso_expansion)
            .max(range.body_y * self.body_expansion)
            .max(range.body_x * self.body_expansion);

        let farthest_edge = center_x.max(w - center_x).max(center_y).max(h - center_y);
        half = half.min(farthest_edge);

        if half > w.max(h) / 2.0 {
            debug!(half, "crop larger than half the frame, using full-frame crop");
            return default_region;
        }

        let side = half * 2.0;
        CropRegion::new(
            (center_y - half) / h,
            (center_x - half) / w,
            side / h,
            side / w,
        )
    }

    fn ranges(
        &self,
        keypoints: &FrameKeypoints,
        center_y: f32,
        center_x: f32,
        frame_height: usize,
        frame_width: usize,
    ) -> BodyRange {
        let mut range = BodyRange::default();

        for idx in KeypointIndex::TORSO {
            let (py, px) = keypoints.get(idx).to_pixel(frame_height, frame_width);
            range.torso_y = range.torso_y.max((center_y - py).abs());
            range.torso_x = range.torso_x.max((center_x - px).abs());
        }

        for kp in keypoints.keypoints.iter() {
            if !kp.is_confident(self.min_keypoint_score) {
                continue;
            }
            let (py, px) = kp.to_pixel(frame_height, frame_width);
            range.body_y = range.body_y.max((center_y - py).abs());
            range.body_x = range.body_x.max((center_x - px).abs());
        }

        range
    }
}

impl Default for RegionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest distance (pixels) from the hip center to the torso joints and to
/// every confident joint.
#[derive(Debug, Default, Clone, Copy)]
struct BodyRange {
    torso_y: f32,
    torso_x: f32,
    body_y: f32,
    body_x: f32,
}

/// Maps crop-local normalized keypoints back to full-frame coordinates.
pub fn remap_keypoints(local: &FrameKeypoints, crop: &CropRegion) -> FrameKeypoints {
    let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
    for (out, kp) in keypoints.iter_mut().zip(local.keypoints.iter()) {
        *out = Keypoint {
            x: crop.x_min + kp.x * crop.width,
            y: crop.y_min + kp.y * crop.height,
            confidence: kp.confidence,
        };
    }
    FrameKeypoints::new(keypoints)
}
